use std::fmt;

use crate::agent::Robot;

/// A complete traversal algorithm.
///
/// A strategy drives the robot through its planned cells and returns when
/// the plan is exhausted. Strategies never route around obstacles: a refused
/// move just leaves the robot where it is and the plan moves on.
pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Walks the whole plan, or stops early once the robot is halted.
    fn clean(&mut self, robot: &mut Robot<'_>) -> Outcome;
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every planned cell was attempted.
    Finished,
    /// The robot was halted with planned cells left.
    Stopped,
}

/// Names the built-in strategies, for configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Zigzag,
    #[default]
    Spiral,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Zigzag => Box::new(Zigzag),
            StrategyKind::Spiral => Box::new(Spiral),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyKind::Zigzag => "zigzag",
            StrategyKind::Spiral => "spiral",
        })
    }
}

/// Boustrophedon coverage: row by row from the top, reversing direction on
/// every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct Zigzag;

impl Strategy for Zigzag {
    fn name(&self) -> &'static str {
        "zigzag"
    }

    fn clean(&mut self, robot: &mut Robot<'_>) -> Outcome {
        let width = robot.room().width() as isize;
        let height = robot.room().height() as isize;
        let mut rightward = true;

        for y in 0..height {
            for step in 0..width {
                if robot.is_halted() {
                    return Outcome::Stopped;
                }
                let x = if rightward { step } else { width - 1 - step };
                robot.move_to(x, y);
                robot.clean_current_spot();
            }
            rightward = !rightward;
        }
        Outcome::Finished
    }
}

/// East, south, west, north.
const HEADINGS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Square spiral outward from the centre cell.
///
/// Segment lengths run 1, 1, 2, 2, 3, 3, ... and the walk stops once the
/// segment length exceeds the shorter side of the room. That bound does not
/// promise full coverage. The planned position keeps advancing when a move
/// is refused, so the spiral shape is kept even past obstacles and edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spiral;

impl Strategy for Spiral {
    fn name(&self) -> &'static str {
        "spiral"
    }

    fn clean(&mut self, robot: &mut Robot<'_>) -> Outcome {
        let width = robot.room().width() as isize;
        let height = robot.room().height() as isize;
        let limit = width.min(height);

        let mut x = (width - 1) / 2;
        let mut y = (height - 1) / 2;
        robot.move_to(x, y);
        robot.clean_current_spot();

        let mut segment = 1;
        let mut heading = 0;
        while segment <= limit {
            let (dx, dy) = HEADINGS[heading];
            for _ in 0..segment {
                if robot.is_halted() {
                    return Outcome::Stopped;
                }
                x += dx;
                y += dy;
                robot.move_to(x, y);
                robot.clean_current_spot();
            }
            heading = (heading + 1) % HEADINGS.len();
            if heading % 2 == 0 {
                segment += 1;
            }
        }
        Outcome::Finished
    }
}
