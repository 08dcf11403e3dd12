use std::ops::{Index, IndexMut};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: isize,
        y: isize,
        width: usize,
        height: usize,
    },
    #[error("Grid dimensions must be positive, got ({width}, {height})")]
    EmptyDimensions { width: usize, height: usize },
    #[error("Grid of size ({width}, {height}) has too many cells")]
    TooLarge { width: usize, height: usize },
    #[error("Cell ({x}, {y}) holds no dirt to clean")]
    NotDirt { x: usize, y: usize },
    #[error("Cannot place {requested} cells, only {available} are free")]
    Overfilled { requested: usize, available: usize },
}

/// A fixed-size 2D grid.
///
/// Cells are stored in a flat vector in row-major order. Coordinates handed in
/// from outside are signed so that positions planned beyond the left or top
/// edge can be asked about without wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid of the given dimensions with every cell set to `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns `GridError::EmptyDimensions` if either dimension is zero and
    /// `GridError::TooLarge` if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError>
    where
        T: Default + Clone,
    {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimensions { width, height });
        }
        let size = width
            .checked_mul(height)
            .ok_or(GridError::TooLarge { width, height })?;
        Ok(Grid {
            width,
            height,
            cells: vec![T::default(); size],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Resolves signed coordinates to a cell position.
    ///
    /// Returns `None` for anything outside `[0, width) x [0, height)`.
    #[inline]
    pub fn locate(&self, x: isize, y: isize) -> Option<Position> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.is_valid(x, y).then_some(Position { x, y })
    }

    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        self.is_valid(x, y).then(|| y * self.width + x)
    }

    /// Gets the cell at the given signed coordinates, `None` if out of bounds.
    pub fn get(&self, x: isize, y: isize) -> Option<&T> {
        let pos = self.locate(x, y)?;
        self.cells.get(pos.y * self.width + pos.x)
    }

    /// Overwrites the cell at the given signed coordinates.
    ///
    /// # Errors
    ///
    /// Returns `GridError::OutOfBounds` if the coordinates are invalid.
    pub fn set(&mut self, x: isize, y: isize, value: T) -> Result<(), GridError> {
        let pos = self.locate(x, y).ok_or(GridError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self[pos] = value;
        Ok(())
    }

    /// Iterates over the cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Iterates over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width)
    }

    /// Yields `(Position, &T)` for every cell in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let pos = Position {
                x: index % width,
                y: index / width,
            };
            (pos, cell)
        })
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: Position) -> &Self::Output {
        match self.coords_to_index(pos.x, pos.y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                pos.x, pos.y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, pos: Position) -> &mut Self::Output {
        let (width, height) = (self.width, self.height);
        match self.coords_to_index(pos.x, pos.y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                pos.x, pos.y, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            Grid::<u8>::new(0, 3),
            Err(GridError::EmptyDimensions {
                width: 0,
                height: 3
            })
        );
        assert!(Grid::<u8>::new(4, 0).is_err());
    }

    #[test]
    fn rejects_sizes_that_overflow() {
        assert_eq!(
            Grid::<u8>::new(usize::MAX, 2),
            Err(GridError::TooLarge {
                width: usize::MAX,
                height: 2
            })
        );
    }

    #[test]
    fn locate_rejects_negative_and_overflowing_coordinates() {
        let grid = Grid::<u8>::new(3, 2).unwrap();
        assert_eq!(grid.locate(2, 1), Some(Position { x: 2, y: 1 }));
        assert_eq!(grid.locate(-1, 0), None);
        assert_eq!(grid.locate(0, -1), None);
        assert_eq!(grid.locate(3, 0), None);
        assert_eq!(grid.locate(0, 2), None);
    }

    #[test]
    fn set_out_of_bounds_reports_coordinates() {
        let mut grid = Grid::<u8>::new(3, 2).unwrap();
        assert_eq!(
            grid.set(-1, 5, 1),
            Err(GridError::OutOfBounds {
                x: -1,
                y: 5,
                width: 3,
                height: 2
            })
        );
        assert!(grid.iter().all(|cell| *cell == 0));
    }

    #[test]
    fn storage_is_row_major() {
        let mut grid = Grid::<u8>::new(3, 2).unwrap();
        grid.set(1, 1, 7).unwrap();
        let rows: Vec<&[u8]> = grid.rows().collect();
        assert_eq!(rows, vec![&[0, 0, 0][..], &[0, 7, 0][..]]);
        let (pos, _) = grid.enumerate().find(|(_, cell)| **cell == 7).unwrap();
        assert_eq!(pos, Position { x: 1, y: 1 });
        assert_eq!(grid[Position { x: 1, y: 1 }], 7);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn indexing_outside_panics() {
        let grid = Grid::<u8>::new(2, 2).unwrap();
        let _ = grid[Position { x: 2, y: 0 }];
    }
}
