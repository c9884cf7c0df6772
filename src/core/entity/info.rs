//=========================================================================
// Entity Info
//=========================================================================
//
// Registry-side state for one staged entity.
//
// Created exactly once when the entity enters a stage and dropped when it
// leaves. Grouped by the subsystem that reads and writes each field.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::Point;

//=== Internal Dependencies ===============================================

use super::INVALID;
use crate::core::motion::{CommandQueue, MotionState};
use crate::core::overlay::OverlayAttachment;
use crate::core::timeline::LocalClock;
use crate::core::track::TrackBinding;

//=== EntityInfo ==========================================================

#[derive(Debug)]
pub(crate) struct EntityInfo {
    //--- Placement -------------------------------------------------------
    pub position: Point,
    /// Radians, 0 along +x.
    pub heading: f64,
    pub visible: bool,
    /// Tooltip-like entities: never queue motion, never draw.
    pub transient: bool,

    //--- Depth Order Ring -------------------------------------------------
    pub prev: u32,
    pub next: u32,

    //--- Selection --------------------------------------------------------
    pub selected: bool,
    pub selection_hit: u32,

    //--- Subsystems -------------------------------------------------------
    pub overlay: Option<OverlayAttachment>,
    pub clock: LocalClock,
    pub motion: MotionState,
    pub pending: CommandQueue,
    pub track: Option<TrackBinding>,
}

impl EntityInfo {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            heading: 0.0,
            visible: true,
            transient: false,
            prev: INVALID,
            next: INVALID,
            selected: false,
            selection_hit: 0,
            overlay: None,
            clock: LocalClock::default(),
            motion: MotionState::Idle,
            pending: CommandQueue::new(),
            track: None,
        }
    }

    /// Busy entities defer every motion and pen request to their queue.
    pub fn is_busy(&self) -> bool {
        !matches!(self.motion, MotionState::Idle)
    }
}
