//=========================================================================
// Operation Outcomes
//=========================================================================
//
// Defined no-op branches of the stage API.
//
// None of these are failures: each names a steady-state branch where a
// request leaves the stage untouched. Internal operations return
// `Result<_, NoOp>`; the public API folds them into `bool`/`Option` and
// logs the reason at debug level.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use log::debug;

//=== NoOp ================================================================

/// Why a stage request changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoOp {
    /// The handle does not belong to this stage (never did, or was removed).
    UnownedHandle,

    /// The motion has zero length, or targets the current position.
    DegenerateMotion,

    /// A reorder where the mover is its own target, or already in place.
    SelfTargetReorder,

    /// The owner already shows this overlay; only its metadata was refreshed.
    OverlayAlreadyAttached,

    /// The drawing track handle does not belong to this stage.
    UnknownTrack,

    /// The entity already had the requested selection state.
    SelectionUnchanged,

    /// The entity has no overlay attached.
    NoOverlay,
}

impl fmt::Display for NoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOp::UnownedHandle => write!(f, "entity is not owned by this stage"),
            NoOp::DegenerateMotion => write!(f, "motion has no displacement"),
            NoOp::SelfTargetReorder => write!(f, "reorder target is the mover itself"),
            NoOp::OverlayAlreadyAttached => write!(f, "overlay already attached to owner"),
            NoOp::UnknownTrack => write!(f, "track is not owned by this stage"),
            NoOp::SelectionUnchanged => write!(f, "selection state unchanged"),
            NoOp::NoOverlay => write!(f, "no overlay attached"),
        }
    }
}

impl std::error::Error for NoOp {}

//--- settle() ------------------------------------------------------------
//
// Folds an internal result into the boolean the public API returns.
//
pub(crate) fn settle(operation: &str, result: Result<(), NoOp>) -> bool {
    match result {
        Ok(()) => true,
        Err(reason) => {
            debug!("{} skipped: {}", operation, reason);
            false
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
