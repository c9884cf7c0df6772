//=========================================================================
// Motion System
//=========================================================================
//
// Positioning, gliding and the deferred command queue.
//
// Architecture:
//   MotionCommand      (one deferred operation, exhaustive enum)
//   CommandQueue       (per-entity FIFO, non-empty only while busy)
//   MotionState        (Idle | Gliding(Glide) | Draining)
//   engine             (Stage methods: submit, place, advance_motion)
//
//=========================================================================

//=== Module Declarations =================================================

mod command;
mod engine;
mod glide;

//=== Public API ==========================================================

pub use command::{CommandQueue, MotionCommand, MoveTarget};
pub use glide::{Glide, GlideStep, MotionState};

pub(crate) use command::to_radians;
