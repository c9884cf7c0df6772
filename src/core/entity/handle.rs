//=========================================================================
// Handles
//=========================================================================
//
// Opaque, generational handles for entities, overlays and tracks.
//
// Every handle carries the tag of the stage that issued it, a slot index
// and (for recyclable slots) a generation counter. A handle is owned by a
// stage only while all three match, so stale handles and handles from a
// different stage both resolve to "not owned".
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

//=== Stage Tags ==========================================================

static NEXT_STAGE_TAG: AtomicU32 = AtomicU32::new(1);

/// Allocates the tag stamped into every handle a new stage issues.
pub(crate) fn next_stage_tag() -> u32 {
    NEXT_STAGE_TAG.fetch_add(1, Ordering::Relaxed)
}

/// Sentinel for "no slot" in ring link fields.
pub(crate) const INVALID: u32 = u32::MAX;

//=== EntityId ============================================================

/// A handle to an entity registered in a [`Stage`](crate::core::stage::Stage).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub(crate) stage: u32,
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// Returns the raw slot index (diagnostics only).
    pub fn index(self) -> u32 {
        self.idx
    }

    /// Returns the slot generation.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}@gen{}/s{})", self.idx, self.generation, self.stage)
    }
}

//=== OverlayId ===========================================================

/// A handle to a shared overlay (speech or thought bubble).
///
/// Overlays live in their own store, outside the depth-order ring, so an
/// `OverlayId` can never be confused with an [`EntityId`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId {
    pub(crate) stage: u32,
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OverlayId({}@gen{}/s{})", self.idx, self.generation, self.stage)
    }
}

//=== TrackId =============================================================

/// A handle to a drawing track. Tracks are never freed, so no generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId {
    pub(crate) stage: u32,
    pub(crate) idx: u32,
}

impl fmt::Debug for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackId({}/s{})", self.idx, self.stage)
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tags_are_unique() {
        let a = next_stage_tag();
        let b = next_stage_tag();
        assert_ne!(a, b);
    }

    #[test]
    fn handles_compare_all_fields() {
        let a = EntityId { stage: 1, idx: 0, generation: 0 };
        let b = EntityId { stage: 1, idx: 0, generation: 1 };
        let c = EntityId { stage: 2, idx: 0, generation: 0 };
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{:?}", b), "EntityId(0@gen1/s1)");
    }
}
