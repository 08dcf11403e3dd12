use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::{
    Position,
    room::Room,
    strategy::{Outcome, Strategy},
};

/// What an observer wants the run to do after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receives the room and robot position after every successful move and
/// every cleaning action.
///
/// Observers only get a shared borrow of the room, so they can draw it but
/// never change it. Returning [`Flow::Stop`] halts the run before the next
/// planned step.
pub trait Observer {
    fn on_step(&mut self, room: &Room, robot: Position) -> Flow;
}

/// An observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quiet;

impl Observer for Quiet {
    fn on_step(&mut self, _room: &Room, _robot: Position) -> Flow {
        Flow::Continue
    }
}

/// Lifecycle of a cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Advancing,
    Done,
}

/// Outcome of a full run, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub strategy: String,
    pub moves: usize,
    pub blocked: usize,
    pub cleaned: usize,
    pub remaining_dirt: usize,
    /// False when the strategy was halted with planned cells left.
    pub completed: bool,
    pub final_position: Position,
}

/// The robot body: a position on a borrowed room plus the move and clean
/// primitives strategies are built from.
pub struct Robot<'a> {
    room: &'a mut Room,
    observer: &'a mut dyn Observer,
    position: Position,
    halted: bool,
    moves: usize,
    blocked: usize,
    cleaned: usize,
}

impl<'a> Robot<'a> {
    /// Places a robot at `(0, 0)`.
    ///
    /// The start cell is not checked against the room contents. A robot that
    /// starts on an obstacle stays there until its first successful move.
    pub fn new(room: &'a mut Room, observer: &'a mut dyn Observer) -> Self {
        if room.is_obstacle(0, 0) {
            warn!("robot starts on an obstacle at (0, 0)");
        }
        Robot {
            room,
            observer,
            position: Position::ORIGIN,
            halted: false,
            moves: 0,
            blocked: 0,
            cleaned: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn room(&self) -> &Room {
        self.room
    }

    /// True once an observer has asked the run to stop.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Moves to `(x, y)` if it lies inside the room and is not an obstacle.
    ///
    /// A refused move leaves the position untouched and returns `false`; it
    /// is a normal outcome, strategies simply carry on with their plan.
    pub fn move_to(&mut self, x: isize, y: isize) -> bool {
        let target = match self.room.cells().locate(x, y) {
            Some(pos) if !self.room.is_obstacle(x, y) => pos,
            Some(_) => {
                debug!(x, y, "move blocked by obstacle");
                self.blocked += 1;
                return false;
            }
            None => {
                debug!(x, y, "move blocked by room edge");
                self.blocked += 1;
                return false;
            }
        };

        self.position = target;
        self.moves += 1;
        trace!(x = target.x, y = target.y, "moved");
        self.notify();
        true
    }

    /// Cleans the cell under the robot if, and only if, it is dirty.
    pub fn clean_current_spot(&mut self) {
        let (x, y) = self.position.signed();
        if self.room.is_dirt(x, y) && self.room.clean(x, y) == Ok(true) {
            self.cleaned += 1;
            debug!(x, y, "cleaned dirt");
            self.notify();
        }
    }

    fn notify(&mut self) {
        if self.observer.on_step(self.room, self.position) == Flow::Stop {
            debug!("observer requested stop");
            self.halted = true;
        }
    }
}

/// A robot paired with the strategy that drives it.
pub struct Agent<'a> {
    robot: Robot<'a>,
    strategy: Box<dyn Strategy>,
    phase: Phase,
}

impl<'a> Agent<'a> {
    pub fn new(
        room: &'a mut Room,
        observer: &'a mut dyn Observer,
        strategy: Box<dyn Strategy>,
    ) -> Self {
        Agent {
            robot: Robot::new(room, observer),
            strategy,
            phase: Phase::Idle,
        }
    }

    pub fn robot(&self) -> &Robot<'a> {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut Robot<'a> {
        &mut self.robot
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Hands the robot to the strategy and returns once its traversal ends.
    pub fn start_cleaning(&mut self) -> RunSummary {
        if self.phase != Phase::Idle {
            warn!(phase = ?self.phase, "starting a run that already began");
        }
        info!(
            strategy = self.strategy.name(),
            width = self.robot.room.width(),
            height = self.robot.room.height(),
            dirt = self.robot.room.remaining_dirt(),
            "cleaning started"
        );

        self.phase = Phase::Advancing;
        let outcome = self.strategy.clean(&mut self.robot);
        self.phase = Phase::Done;

        let summary = RunSummary {
            strategy: self.strategy.name().to_string(),
            moves: self.robot.moves,
            blocked: self.robot.blocked,
            cleaned: self.robot.cleaned,
            remaining_dirt: self.robot.room.remaining_dirt(),
            completed: outcome == Outcome::Finished,
            final_position: self.robot.position,
        };
        info!(
            moves = summary.moves,
            blocked = summary.blocked,
            cleaned = summary.cleaned,
            remaining_dirt = summary.remaining_dirt,
            completed = summary.completed,
            "cleaning finished"
        );
        summary
    }
}
