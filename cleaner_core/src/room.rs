use std::fmt;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::debug;

use crate::{
    Position,
    map::{Grid, GridError},
};

/// The state of a single floor cell. Exactly one holds per coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Empty,
    Dirt,
    Obstacle,
    Cleaned,
}

impl CellState {
    /// Symbol used by the text scenario format and the plain renderer.
    pub fn symbol(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Dirt => 'D',
            CellState::Obstacle => '#',
            CellState::Cleaned => 'C',
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "." => Some(CellState::Empty),
            "D" => Some(CellState::Dirt),
            "#" => Some(CellState::Obstacle),
            "C" => Some(CellState::Cleaned),
            _ => None,
        }
    }
}

/// Symbol drawn in place of the cell the robot occupies.
pub const ROBOT_SYMBOL: char = 'R';

/// Errors raised while reading a text scenario.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("Scenario is empty")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown cell code '{code}' at position ({x}, {y})")]
    UnknownCode { code: String, x: usize, y: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// The floor the robot cleans: a bounded grid of cell states.
///
/// Every query on coordinates outside the room answers `false`. Setters fail
/// with [`GridError::OutOfBounds`] instead of touching neighbouring cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    cells: Grid<CellState>,
}

impl Room {
    /// Creates a room with every cell `Empty`.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Ok(Room {
            cells: Grid::new(width, height)?,
        })
    }

    /// Builds a room with `obstacles` obstacle cells and `dirt` dirt cells
    /// placed at random, reproducibly for a given `seed`.
    ///
    /// The start cell `(0, 0)` is always left empty.
    pub fn scatter(
        width: usize,
        height: usize,
        dirt: usize,
        obstacles: usize,
        seed: u64,
    ) -> Result<Self, GridError> {
        let mut room = Room::new(width, height)?;
        let mut free: Vec<Position> = room
            .cells
            .enumerate()
            .map(|(pos, _)| pos)
            .filter(|pos| *pos != Position::ORIGIN)
            .collect();

        let requested = dirt
            .checked_add(obstacles)
            .filter(|requested| *requested <= free.len())
            .ok_or(GridError::Overfilled {
                requested: dirt.saturating_add(obstacles),
                available: free.len(),
            })?;

        let mut rng = StdRng::seed_from_u64(seed);
        free.shuffle(&mut rng);
        for (i, pos) in free.into_iter().take(requested).enumerate() {
            room.cells[pos] = if i < obstacles {
                CellState::Obstacle
            } else {
                CellState::Dirt
            };
        }

        debug!(width, height, dirt, obstacles, seed, "scattered room");
        Ok(room)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cells.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.cells.height()
    }

    /// Read-only view of the underlying cells.
    pub fn cells(&self) -> &Grid<CellState> {
        &self.cells
    }

    pub fn cell(&self, x: isize, y: isize) -> Option<CellState> {
        self.cells.get(x, y).copied()
    }

    pub fn is_in_bounds(&self, x: isize, y: isize) -> bool {
        self.cells.locate(x, y).is_some()
    }

    pub fn is_dirt(&self, x: isize, y: isize) -> bool {
        self.cell(x, y) == Some(CellState::Dirt)
    }

    pub fn is_obstacle(&self, x: isize, y: isize) -> bool {
        self.cell(x, y) == Some(CellState::Obstacle)
    }

    /// Marks a cell as an obstacle, whatever it held before.
    pub fn add_obstacle(&mut self, x: isize, y: isize) -> Result<(), GridError> {
        self.cells.set(x, y, CellState::Obstacle)
    }

    /// Marks a cell as dirty, whatever it held before.
    pub fn add_dirt(&mut self, x: isize, y: isize) -> Result<(), GridError> {
        self.cells.set(x, y, CellState::Dirt)
    }

    /// Turns a dirty cell into a cleaned one.
    ///
    /// Returns `Ok(true)` when the cell was cleaned and `Ok(false)` when the
    /// coordinates lie outside the room, which is a no-op. Any other in-bounds
    /// cell is left as it is and reported as [`GridError::NotDirt`], so an
    /// obstacle can never be cleaned away.
    pub fn clean(&mut self, x: isize, y: isize) -> Result<bool, GridError> {
        let Some(pos) = self.cells.locate(x, y) else {
            return Ok(false);
        };
        match self.cells[pos] {
            CellState::Dirt => {
                self.cells[pos] = CellState::Cleaned;
                Ok(true)
            }
            _ => Err(GridError::NotDirt { x: pos.x, y: pos.y }),
        }
    }

    /// Number of cells currently in `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|cell| **cell == state).count()
    }

    pub fn remaining_dirt(&self) -> usize {
        self.count(CellState::Dirt)
    }

    /// Renders the room one row per line, drawing the robot (if any) as `R`.
    pub fn render_text(&self, robot: Option<Position>) -> String {
        let mut out = String::with_capacity(self.width() * self.height() * 2);
        for (y, row) in self.cells.rows().enumerate() {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(x, cell)| {
                    if robot == Some(Position { x, y }) {
                        ROBOT_SYMBOL.to_string()
                    } else {
                        cell.symbol().to_string()
                    }
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text(None))
    }
}

/// The stock scenario: a 9x9 room with three dirty cells and one obstacle.
pub fn demo_room() -> Room {
    let mut room = Room::new(9, 9).expect("9x9 is a valid room");
    for (x, y) in [(5, 3), (1, 8), (8, 8)] {
        room.add_dirt(x, y).expect("demo dirt lies inside the room");
    }
    room.add_obstacle(8, 4)
        .expect("demo obstacle lies inside the room");
    room
}

/// Loads a room from its text representation.
///
/// Each non-empty line is a row of whitespace separated cell codes
/// (`.` empty, `D` dirt, `#` obstacle, `C` cleaned).
pub fn load_room_from_string(scenario: &str) -> Result<Room, ScenarioError> {
    let rows: Vec<Vec<&str>> = scenario
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split_whitespace().collect())
        .collect();

    let Some(first) = rows.first() else {
        return Err(ScenarioError::Empty);
    };
    let width = first.len();

    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(ScenarioError::RaggedRow {
                row: y,
                expected: width,
                found: row.len(),
            });
        }
    }

    let mut room = Room::new(width, rows.len())?;
    for (y, row) in rows.iter().enumerate() {
        for (x, code) in row.iter().enumerate() {
            let state = CellState::from_symbol(code).ok_or_else(|| ScenarioError::UnknownCode {
                code: code.to_string(),
                x,
                y,
            })?;
            room.cells[Position { x, y }] = state;
        }
    }

    Ok(room)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_is_all_empty() {
        let room = Room::new(4, 3).unwrap();
        assert_eq!(room.count(CellState::Empty), 12);
        assert_eq!(room.remaining_dirt(), 0);
    }

    #[test]
    fn queries_outside_the_room_are_false() {
        let mut room = Room::new(3, 3).unwrap();
        room.add_dirt(2, 2).unwrap();
        room.add_obstacle(0, 2).unwrap();
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (3, 3), (isize::MIN, 0)] {
            assert!(!room.is_in_bounds(x, y));
            assert!(!room.is_dirt(x, y));
            assert!(!room.is_obstacle(x, y));
            assert_eq!(room.cell(x, y), None);
        }
        assert!(room.is_dirt(2, 2));
        assert!(room.is_obstacle(0, 2));
    }

    #[test]
    fn setters_overwrite_and_keep_one_state_per_cell() {
        let mut room = Room::new(2, 2).unwrap();
        room.add_dirt(1, 0).unwrap();
        room.add_obstacle(1, 0).unwrap();
        room.add_dirt(0, 1).unwrap();
        assert_eq!(room.cell(1, 0), Some(CellState::Obstacle));
        assert!(!room.is_dirt(1, 0));
        assert_eq!(room.cell(0, 1), Some(CellState::Dirt));
        assert_eq!(room.cells().iter().count(), 4);
    }

    #[test]
    fn setters_fail_outside_the_room() {
        let mut room = Room::new(2, 2).unwrap();
        assert!(matches!(
            room.add_obstacle(2, 0),
            Err(GridError::OutOfBounds { x: 2, y: 0, .. })
        ));
        assert!(matches!(
            room.add_dirt(0, -1),
            Err(GridError::OutOfBounds { x: 0, y: -1, .. })
        ));
        assert_eq!(room.count(CellState::Empty), 4);
    }

    #[test]
    fn clean_only_converts_dirt() {
        let mut room = Room::new(3, 1).unwrap();
        room.add_dirt(0, 0).unwrap();
        room.add_obstacle(1, 0).unwrap();

        assert_eq!(room.clean(0, 0), Ok(true));
        assert_eq!(room.cell(0, 0), Some(CellState::Cleaned));
        assert_eq!(room.clean(0, 0), Err(GridError::NotDirt { x: 0, y: 0 }));

        assert_eq!(room.clean(1, 0), Err(GridError::NotDirt { x: 1, y: 0 }));
        assert_eq!(room.cell(1, 0), Some(CellState::Obstacle));
        assert_eq!(room.clean(2, 0), Err(GridError::NotDirt { x: 2, y: 0 }));
        assert_eq!(room.cell(2, 0), Some(CellState::Empty));
    }

    #[test]
    fn clean_outside_the_room_is_a_noop() {
        let mut room = Room::new(2, 2).unwrap();
        assert_eq!(room.clean(-1, 0), Ok(false));
        assert_eq!(room.clean(5, 5), Ok(false));
    }

    #[test]
    fn renders_robot_over_cell() {
        let room = demo_room();
        let text = room.render_text(Some(Position { x: 8, y: 4 }));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[3], ". . . . . D . . .");
        assert_eq!(lines[4], ". . . . . . . . R");
        assert_eq!(lines[8], ". D . . . . . . D");
    }

    #[test]
    fn parses_rendered_text() {
        let room = demo_room();
        assert_eq!(load_room_from_string(&room.to_string()), Ok(room));
    }

    #[test]
    fn parses_all_codes_and_ignores_blank_lines() {
        let room = load_room_from_string("\n . D\n\n # C \n").unwrap();
        assert_eq!(room.width(), 2);
        assert_eq!(room.height(), 2);
        assert_eq!(room.cell(0, 0), Some(CellState::Empty));
        assert_eq!(room.cell(1, 0), Some(CellState::Dirt));
        assert_eq!(room.cell(0, 1), Some(CellState::Obstacle));
        assert_eq!(room.cell(1, 1), Some(CellState::Cleaned));
    }

    #[test]
    fn rejects_malformed_scenarios() {
        assert_eq!(load_room_from_string("  \n\n"), Err(ScenarioError::Empty));
        assert_eq!(
            load_room_from_string(". .\n.\n"),
            Err(ScenarioError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            load_room_from_string(". x"),
            Err(ScenarioError::UnknownCode {
                code: "x".to_string(),
                x: 1,
                y: 0
            })
        );
    }

    #[test]
    fn scatter_is_reproducible_and_spares_the_start() {
        let a = Room::scatter(6, 5, 4, 3, 42).unwrap();
        let b = Room::scatter(6, 5, 4, 3, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.remaining_dirt(), 4);
        assert_eq!(a.count(CellState::Obstacle), 3);
        assert_eq!(a.cell(0, 0), Some(CellState::Empty));
    }

    #[test]
    fn scatter_rejects_counts_that_overflow() {
        assert_eq!(
            Room::scatter(3, 3, usize::MAX, 2, 0),
            Err(GridError::Overfilled {
                requested: usize::MAX,
                available: 8
            })
        );
        assert!(matches!(
            Room::scatter(usize::MAX, 2, 1, 1, 0),
            Err(GridError::TooLarge { .. })
        ));
    }

    #[test]
    fn scatter_refuses_to_overfill() {
        assert_eq!(
            Room::scatter(2, 2, 2, 2, 0),
            Err(GridError::Overfilled {
                requested: 4,
                available: 3
            })
        );
    }
}
