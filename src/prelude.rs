//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use tableau_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::core::TickDriver;

// Stage
pub use crate::core::stage::{Removal, Stage, StageConfig, StageEvent, StageRequest};

// Entities
pub use crate::core::entity::{Entity, EntityContext, EntityId, OverlayId, TrackId};

// Motion
pub use crate::core::motion::{MotionCommand, MoveTarget};

// Overlays
pub use crate::core::overlay::{Expiry, OverlayKind, OverlaySource};

// Tracks
pub use crate::core::track::{Color, Pen, TrackMark};

// Outcomes
pub use crate::core::outcome::NoOp;

// Geometry
pub use kurbo::{Point, Rect, Vec2};
