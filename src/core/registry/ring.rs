//=========================================================================
// Entity Registry
//=========================================================================
//
// Slot arena with a circular, doubly-linked depth-order ring.
//
// Architecture:
//   slots: Vec<Slot>       (index = EntityId.idx, generation-checked)
//   free_list: Vec<u32>    (recycled slots, generation bumped on free)
//   head: u32              (first painted; head.prev is the topmost)
//
// Insertion splices a new entity just before the head, so the newest
// entity is painted last. Reordering unlinks the mover and relinks it
// next to its target; only the mover, its old neighbours and the
// target's side are touched.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::Point;

//=== Internal Dependencies ===============================================

use crate::core::entity::{Entity, EntityId, EntityInfo, INVALID};
use crate::core::outcome::NoOp;

//=== Occupant ============================================================

/// A live entity: the stage's bookkeeping plus the entity itself.
pub(crate) struct Occupant {
    pub info: EntityInfo,
    pub behavior: Box<dyn Entity>,
}

struct Slot {
    generation: u32,
    occupant: Option<Occupant>,
}

//=== Direction ===========================================================

/// Walk direction over the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Head to tail: paint order, bottom-most first.
    BackToFront,
    /// Tail to head: hit-test order, topmost first.
    FrontToBack,
}

//=== Registry ============================================================

pub(crate) struct Registry {
    stage: u32,
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    head: u32,
    len: usize,
}

impl Registry {
    pub fn new(stage: u32) -> Self {
        Self {
            stage,
            slots: Vec::new(),
            free_list: Vec::new(),
            head: INVALID,
            len: 0,
        }
    }

    //--- Ownership --------------------------------------------------------

    /// Resolves a handle to its slot index if this registry owns it.
    pub fn resolve(&self, id: EntityId) -> Result<u32, NoOp> {
        if id.stage != self.stage {
            return Err(NoOp::UnownedHandle);
        }
        match self.slots.get(id.idx as usize) {
            Some(slot) if slot.generation == id.generation && slot.occupant.is_some() => Ok(id.idx),
            _ => Err(NoOp::UnownedHandle),
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.resolve(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    //--- Access -----------------------------------------------------------

    pub fn occupant(&self, id: EntityId) -> Option<&Occupant> {
        let idx = self.resolve(id).ok()?;
        self.slots[idx as usize].occupant.as_ref()
    }

    pub fn occupant_mut(&mut self, id: EntityId) -> Option<&mut Occupant> {
        let idx = self.resolve(id).ok()?;
        self.slots[idx as usize].occupant.as_mut()
    }

    pub fn info(&self, id: EntityId) -> Option<&EntityInfo> {
        self.occupant(id).map(|o| &o.info)
    }

    pub fn info_mut(&mut self, id: EntityId) -> Option<&mut EntityInfo> {
        self.occupant_mut(id).map(|o| &mut o.info)
    }

    pub fn behavior_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity> {
        let occupant = self.occupant_mut(id)?;
        let behavior: &mut dyn Entity = occupant.behavior.as_mut();
        Some(behavior)
    }

    //--- Ring Queries -----------------------------------------------------

    /// First entity painted.
    pub fn head(&self) -> Option<EntityId> {
        self.id_at(self.head)
    }

    /// Last entity painted (topmost).
    pub fn tail(&self) -> Option<EntityId> {
        self.head().and_then(|head| self.prev(head))
    }

    pub fn next(&self, id: EntityId) -> Option<EntityId> {
        self.info(id).and_then(|info| self.id_at(info.next))
    }

    pub fn prev(&self, id: EntityId) -> Option<EntityId> {
        self.info(id).and_then(|info| self.id_at(info.prev))
    }

    /// Snapshot of the ring in the given direction.
    pub fn walk(&self, direction: Direction) -> Vec<EntityId> {
        let mut order = Vec::with_capacity(self.len);
        let start = match direction {
            Direction::BackToFront => self.head(),
            Direction::FrontToBack => self.tail(),
        };
        let mut current = start;
        while let Some(id) = current {
            order.push(id);
            if order.len() == self.len {
                break;
            }
            current = match direction {
                Direction::BackToFront => self.next(id),
                Direction::FrontToBack => self.prev(id),
            };
        }
        order
    }

    //--- Insertion / Removal ----------------------------------------------

    /// Places a new entity just before the head.
    pub fn insert(&mut self, behavior: Box<dyn Entity>, position: Point) -> EntityId {
        let occupant = Occupant {
            info: EntityInfo::new(position),
            behavior,
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize].occupant = Some(occupant);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                occupant: Some(occupant),
            });
            idx
        };

        self.len += 1;
        if self.head == INVALID {
            self.link_alone(idx);
        } else {
            self.link_before(idx, self.head);
        }

        EntityId {
            stage: self.stage,
            idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    /// Unlinks and frees an entity's slot, handing back its occupant.
    pub fn remove(&mut self, id: EntityId) -> Result<Occupant, NoOp> {
        let idx = self.resolve(id)?;
        self.unlink(idx);
        self.len -= 1;

        let slot = &mut self.slots[idx as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx);
        slot.occupant.take().ok_or(NoOp::UnownedHandle)
    }

    //--- Reordering -------------------------------------------------------

    /// Moves `mover` in front of `target`, or to the very front.
    pub fn bring_to_front(&mut self, mover: EntityId, target: Option<EntityId>) -> Result<(), NoOp> {
        let idx = self.resolve(mover)?;
        match target {
            None => {
                self.unlink(idx);
                self.link_front(idx);
            }
            Some(target) => {
                let anchor = self.resolve(target)?;
                if anchor == idx {
                    return Err(NoOp::SelfTargetReorder);
                }
                self.unlink(idx);
                let after = self.link(anchor).next;
                self.link_before(idx, after);
            }
        }
        Ok(())
    }

    /// Moves `mover` behind `target`, or to the very back.
    pub fn send_to_back(&mut self, mover: EntityId, target: Option<EntityId>) -> Result<(), NoOp> {
        let idx = self.resolve(mover)?;
        match target {
            None => {
                self.unlink(idx);
                self.link_front(idx);
                self.head = idx;
            }
            Some(target) => {
                let anchor = self.resolve(target)?;
                if anchor == idx {
                    return Err(NoOp::SelfTargetReorder);
                }
                self.unlink(idx);
                self.link_before(idx, anchor);
                if self.head == anchor {
                    self.head = idx;
                }
            }
        }
        Ok(())
    }

    /// Moves `mover` up to `n` places toward the front.
    pub fn bring_forward(&mut self, mover: EntityId, n: usize) -> Result<(), NoOp> {
        self.resolve(mover)?;
        let mut target = mover;
        for _ in 0..n {
            match self.next(target) {
                Some(next) if Some(next) != self.head() => target = next,
                _ => break,
            }
        }
        if target == mover {
            return Err(NoOp::SelfTargetReorder);
        }
        self.bring_to_front(mover, Some(target))
    }

    /// Moves `mover` up to `n` places toward the back.
    pub fn send_backward(&mut self, mover: EntityId, n: usize) -> Result<(), NoOp> {
        self.resolve(mover)?;
        let mut target = mover;
        for _ in 0..n {
            if Some(target) == self.head() {
                break;
            }
            match self.prev(target) {
                Some(prev) => target = prev,
                None => break,
            }
        }
        if target == mover {
            return Err(NoOp::SelfTargetReorder);
        }
        self.send_to_back(mover, Some(target))
    }

    //--- Internal Helpers -------------------------------------------------

    fn id_at(&self, idx: u32) -> Option<EntityId> {
        if idx == INVALID {
            return None;
        }
        let slot = self.slots.get(idx as usize)?;
        slot.occupant.as_ref()?;
        Some(EntityId {
            stage: self.stage,
            idx,
            generation: slot.generation,
        })
    }

    fn link(&self, idx: u32) -> &EntityInfo {
        // Only called on indices already resolved or read from live links.
        match self.slots[idx as usize].occupant.as_ref() {
            Some(occupant) => &occupant.info,
            None => unreachable!("ring link points at a free slot"),
        }
    }

    fn link_mut(&mut self, idx: u32) -> &mut EntityInfo {
        match self.slots[idx as usize].occupant.as_mut() {
            Some(occupant) => &mut occupant.info,
            None => unreachable!("ring link points at a free slot"),
        }
    }

    fn link_alone(&mut self, idx: u32) {
        let info = self.link_mut(idx);
        info.prev = idx;
        info.next = idx;
        self.head = idx;
    }

    // Splices `idx` between `anchor.prev` and `anchor`.
    fn link_before(&mut self, idx: u32, anchor: u32) {
        let prev = self.link(anchor).prev;
        {
            let info = self.link_mut(idx);
            info.prev = prev;
            info.next = anchor;
        }
        self.link_mut(prev).next = idx;
        self.link_mut(anchor).prev = idx;
    }

    // Places `idx` just before the head, i.e. topmost.
    fn link_front(&mut self, idx: u32) {
        if self.head == INVALID {
            self.link_alone(idx);
        } else {
            self.link_before(idx, self.head);
        }
    }

    fn unlink(&mut self, idx: u32) {
        let (prev, next) = {
            let info = self.link(idx);
            (info.prev, info.next)
        };

        if next == idx {
            self.head = INVALID;
        } else {
            self.link_mut(prev).next = next;
            self.link_mut(next).prev = prev;
            if self.head == idx {
                self.head = next;
            }
        }

        let info = self.link_mut(idx);
        info.prev = INVALID;
        info.next = INVALID;
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
