//=========================================================================
// Motion Commands
//=========================================================================
//
// Deferred operations queued while an entity is busy gliding.
//
// Every request that touches position, heading or pen goes through one of
// these variants when it cannot run immediately. The queue replays them in
// arrival order, one per tick, once the glide in flight completes.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

use kurbo::{Point, Vec2};

//=== Internal Dependencies ===============================================

use crate::core::track::Color;

//=== MoveTarget ==========================================================

/// Where a move ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveTarget {
    /// An absolute scene position.
    Absolute(Point),

    /// A displacement from wherever the entity is when the move runs.
    Relative(Vec2),
}

impl MoveTarget {
    /// Resolves the target against a starting position.
    pub fn destination(self, from: Point) -> Point {
        match self {
            MoveTarget::Absolute(point) => point,
            MoveTarget::Relative(delta) => from + delta,
        }
    }
}

//=== Angle ===============================================================

/// Converts a heading value to radians.
pub(crate) fn to_radians(value: f64, is_radian: bool) -> f64 {
    if is_radian {
        value
    } else {
        value.to_radians()
    }
}

//=== MotionCommand =======================================================

/// One deferred operation. Exactly one variant is ever active, and the
/// replay loop matches all of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    /// Move to a target; `duration` in seconds, `0` means instantly.
    Move {
        target: MoveTarget,
        duration: f64,
        update_heading: bool,
    },

    /// Move `length` along the heading the entity has when this runs.
    Advance { length: f64, duration: f64 },

    /// Clear the bound track.
    TrackReset,

    /// Raise (`false`) or lower (`true`) the pen.
    TrackDrawing(bool),

    PenWidth(u8),

    PenColor(Color),

    /// Absolute heading.
    Heading { value: f64, is_radian: bool },

    /// Heading change relative to the current one.
    Rotation { value: f64, is_radian: bool },

    /// Imprint the entity on its bound track.
    Stamp,
}

//=== CommandQueue ========================================================

/// FIFO of deferred commands for one entity.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    queue: VecDeque<MotionCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a command behind everything already queued.
    pub fn push(&mut self, command: MotionCommand) {
        self.queue.push_back(command);
    }

    /// Takes the oldest command.
    pub fn pop(&mut self) -> Option<MotionCommand> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotionCommand> {
        self.queue.iter()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
