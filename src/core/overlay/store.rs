//=========================================================================
// Overlay Store
//=========================================================================
//
// Reference-counted storage for shared overlays.
//
// An overlay is created with a count of zero and must be retained by its
// first owner straight away. Destruction is a pure function of the count:
// the release that brings it to zero frees the slot and drops the entity.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::entity::{Entity, OverlayId};
use crate::core::outcome::NoOp;

//=== Release =============================================================

/// Outcome of dropping one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other owners still reference the overlay.
    Retained(u32),
    /// That was the last reference; the overlay is gone.
    Destroyed,
}

//=== OverlayStore ========================================================

struct SharedOverlay {
    behavior: Box<dyn Entity>,
    refcount: u32,
}

struct OverlaySlot {
    generation: u32,
    overlay: Option<SharedOverlay>,
}

pub(crate) struct OverlayStore {
    stage: u32,
    slots: Vec<OverlaySlot>,
    free_list: Vec<u32>,
    len: usize,
}

impl OverlayStore {
    pub fn new(stage: u32) -> Self {
        Self {
            stage,
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores a new overlay with no references yet.
    pub fn create(&mut self, behavior: Box<dyn Entity>) -> OverlayId {
        let overlay = SharedOverlay {
            behavior,
            refcount: 0,
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize].overlay = Some(overlay);
            idx
        } else {
            self.slots.push(OverlaySlot {
                generation: 0,
                overlay: Some(overlay),
            });
            self.slots.len() as u32 - 1
        };
        self.len += 1;
        OverlayId {
            stage: self.stage,
            idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.get(id).is_some()
    }

    pub fn refcount(&self, id: OverlayId) -> Option<u32> {
        self.get(id).map(|o| o.refcount)
    }

    pub fn behavior(&self, id: OverlayId) -> Option<&dyn Entity> {
        self.get(id).map(|o| o.behavior.as_ref())
    }

    /// Live overlays.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Adds one reference.
    pub fn retain(&mut self, id: OverlayId) -> Result<u32, NoOp> {
        let overlay = self.get_mut(id).ok_or(NoOp::UnownedHandle)?;
        overlay.refcount += 1;
        Ok(overlay.refcount)
    }

    /// Drops one reference, destroying the overlay on the last one.
    pub fn release(&mut self, id: OverlayId) -> Result<Release, NoOp> {
        let overlay = self.get_mut(id).ok_or(NoOp::UnownedHandle)?;
        overlay.refcount = overlay.refcount.saturating_sub(1);
        if overlay.refcount > 0 {
            return Ok(Release::Retained(overlay.refcount));
        }

        let slot = &mut self.slots[id.idx as usize];
        slot.overlay = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.idx);
        self.len -= 1;
        Ok(Release::Destroyed)
    }

    //--- Internal Helpers -------------------------------------------------

    fn get(&self, id: OverlayId) -> Option<&SharedOverlay> {
        if id.stage != self.stage {
            return None;
        }
        let slot = self.slots.get(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.overlay.as_ref()
    }

    fn get_mut(&mut self, id: OverlayId) -> Option<&mut SharedOverlay> {
        if id.stage != self.stage {
            return None;
        }
        let slot = self.slots.get_mut(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.overlay.as_mut()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    struct Bubble;

    impl Entity for Bubble {
        fn bounding_box(&self) -> Rect {
            Rect::new(0.0, 0.0, 40.0, 20.0)
        }
    }

    #[test]
    fn release_destroys_on_last_reference() {
        let mut store = OverlayStore::new(1);
        let id = store.create(Box::new(Bubble));
        assert_eq!(store.retain(id), Ok(1));
        assert_eq!(store.retain(id), Ok(2));

        assert_eq!(store.release(id), Ok(Release::Retained(1)));
        assert!(store.contains(id));
        assert_eq!(store.release(id), Ok(Release::Destroyed));
        assert!(!store.contains(id));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn destroyed_handles_stay_dead_after_reuse() {
        let mut store = OverlayStore::new(1);
        let old = store.create(Box::new(Bubble));
        store.retain(old).unwrap();
        store.release(old).unwrap();

        let fresh = store.create(Box::new(Bubble));
        assert_eq!(fresh.idx, old.idx);
        assert_eq!(store.len(), 1);
        assert_eq!(store.retain(old), Err(NoOp::UnownedHandle));
        assert_eq!(store.refcount(fresh), Some(0));
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let mut store = OverlayStore::new(1);
        let id = store.create(Box::new(Bubble));
        let foreign = OverlayId { stage: 2, ..id };
        assert_eq!(store.release(foreign), Err(NoOp::UnownedHandle));
        assert!(store.behavior(id).is_some());
    }

    #[test]
    fn len_counts_live_overlays() {
        let mut store = OverlayStore::new(1);
        let a = store.create(Box::new(Bubble));
        let b = store.create(Box::new(Bubble));
        store.retain(a).unwrap();
        store.retain(b).unwrap();
        assert_eq!(store.len(), 2);

        store.release(a).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.release(a), Err(NoOp::UnownedHandle));
        assert_eq!(store.len(), 1);
    }
}
