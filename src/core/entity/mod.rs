//=========================================================================
// Entity System
//=========================================================================
//
// The capability contract every staged object satisfies, plus the
// handles and per-entity bookkeeping the registry keeps for it.
//
// Architecture:
//   Stage
//     └─ Registry
//          └─ Slot { info: EntityInfo, behavior: Box<dyn Entity> }
//
// The stage owns position, order, clocks and motion; the entity owns its
// extent, its animation frames and its reactions to notifications.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::{Point, Rect};

//=== Module Declarations =================================================

mod context;
mod handle;
mod info;

//=== Public API ==========================================================

pub use context::EntityContext;
pub use handle::{EntityId, OverlayId, TrackId};

pub(crate) use handle::{next_stage_tag, INVALID};
pub(crate) use info::EntityInfo;

//=== Entity Trait ========================================================

/// Capability contract for anything placed on a stage.
///
/// Only [`bounding_box`](Entity::bounding_box) is required. Every hook has
/// an empty default, so simple props implement one method:
///
/// ```rust
/// # use tableau_engine::prelude::*;
/// struct Prop;
///
/// impl Entity for Prop {
///     fn bounding_box(&self) -> Rect {
///         Rect::new(0.0, 0.0, 32.0, 32.0)
///     }
/// }
/// ```
///
/// Hooks receive an [`EntityContext`]. They must not assume the stage is
/// in a quiescent state: anything they want to change is queued through
/// the context and applied after the current operation returns.
pub trait Entity {
    /// Current local extent, relative to the entity's position.
    ///
    /// Used for aggregate bounds, hit testing, border checks and resolving
    /// pen anchors.
    fn bounding_box(&self) -> Rect;

    /// Whether a point in local coordinates hits this entity.
    fn contains(&self, local: Point) -> bool {
        self.bounding_box().contains(local)
    }

    /// Concealed entities are skipped by hit testing even when visible.
    fn is_concealed(&self) -> bool {
        false
    }

    /// Axes `(horizontal, vertical)` on which the entity is clamped to the
    /// scene bounds. Border notification happens regardless.
    fn stops_at_border(&self) -> (bool, bool) {
        (false, false)
    }

    /// Advances the position by the entity's own per-tick speed.
    ///
    /// Called on every local tick with the current position; the stage
    /// reads the result back and relocates the entity if it changed.
    fn step(&mut self, _x: &mut f64, _y: &mut f64) {}

    /// Advances the entity's own animation.
    ///
    /// Returns the duration in milliseconds the next frame should last, or
    /// `0` to fall back to the entity's frame period.
    fn local_update(
        &mut self,
        _cx: &mut EntityContext<'_>,
        _frame_count: u64,
        _elapsed_ms: u64,
    ) -> u64 {
        0
    }

    /// The scene box overflowed the scene bounds by the given amounts
    /// (negative = past the left/top edge, positive = past the right/bottom).
    fn on_border(&mut self, _cx: &mut EntityContext<'_>, _h_overflow: f64, _v_overflow: f64) {}

    /// The entity moved from `old` to `new`.
    fn on_location_changed(&mut self, _cx: &mut EntityContext<'_>, _new: Point, _old: Point) {}

    /// A glide advanced; `progress` is in `(0, 1]`.
    fn on_motion_step(&mut self, _cx: &mut EntityContext<'_>, _progress: f64) {}

    /// A glide reached its target.
    fn on_motion_complete(&mut self, _cx: &mut EntityContext<'_>) {}
}
