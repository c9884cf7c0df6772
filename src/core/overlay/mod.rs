//=========================================================================
// Shared Overlays
//=========================================================================
//
// Speech and thought bubbles that one or more entities can show.
//
// Architecture:
//   OverlayStore               (stage-wide, refcounted, generational)
//     └─ SharedOverlay { behavior, refcount }
//   EntityInfo.overlay: Option<OverlayAttachment>
//     └─ { overlay: OverlayId, kind, expiry }
//
// Lifecycle:
//   first attach → create + retain
//   attach elsewhere / owner removed → release → destroy at zero
//   detach / expiry → hidden, still retained
//
//=========================================================================

//=== Module Declarations =================================================

mod attachment;
mod store;

//=== Public API ==========================================================

pub use attachment::{Expiry, OverlayAttachment, OverlayKind, OverlaySource};

pub(crate) use store::{OverlayStore, Release};
