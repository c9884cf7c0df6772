//=========================================================================
// Drawing Tracks
//=========================================================================
//
// Record of the marks entities leave as they move.
//
// Architecture:
//   TrackStore
//     └─ tracks: Vec<Track>            (append-only, addressed by TrackId)
//          ├─ pen: Pen                 (authoritative for shared bindings)
//          └─ marks: Vec<TrackMark>    (segments and stamps, paint order)
//
//   EntityInfo.track: Option<TrackBinding>
//     ├─ shared = false → binding.pen is the entity's own
//     └─ shared = true  → the track's pen is read and written every use
//
// The renderer replays the marks; nothing here rasterizes.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::Point;

//=== Module Declarations =================================================

mod drawing;
mod pen;

//=== Public API ==========================================================

pub use pen::{Color, Pen};

//=== Internal Dependencies ===============================================

use crate::core::entity::{EntityId, TrackId};

//=== TrackMark ===========================================================

/// One mark left on a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackMark {
    /// A stroke between two anchor positions.
    Segment { from: Point, to: Point, pen: Pen },

    /// An imprint of an entity at its position.
    Stamp { entity: EntityId, at: Point },
}

//=== TrackBinding ========================================================

/// An entity's attachment to a drawing track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBinding {
    pub track: TrackId,
    /// Pen settings live on the track and are synchronized every use.
    pub shared: bool,
    /// Normalized point on the entity's bounding box that draws.
    pub anchor: Point,
    /// The entity's own pen, used when the binding is not shared.
    pub pen: Pen,
}

impl TrackBinding {
    pub fn new(track: TrackId, shared: bool, anchor: Point) -> Self {
        Self {
            track,
            shared,
            anchor,
            pen: Pen::default(),
        }
    }
}

//=== Track ===============================================================

#[derive(Debug, Clone, Default)]
pub(crate) struct Track {
    pub pen: Pen,
    pub marks: Vec<TrackMark>,
}

//=== TrackStore ==========================================================

/// Append-only storage for a stage's tracks.
#[derive(Debug)]
pub(crate) struct TrackStore {
    stage: u32,
    tracks: Vec<Track>,
}

impl TrackStore {
    pub fn new(stage: u32) -> Self {
        Self {
            stage,
            tracks: Vec::new(),
        }
    }

    pub fn create(&mut self) -> TrackId {
        let idx = self.tracks.len() as u32;
        self.tracks.push(Track::default());
        TrackId {
            stage: self.stage,
            idx,
        }
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        if id.stage != self.stage {
            return None;
        }
        self.tracks.get(id.idx as usize)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        if id.stage != self.stage {
            return None;
        }
        self.tracks.get_mut(id.idx as usize)
    }

    //--- Pen Resolution ---------------------------------------------------

    /// The pen in effect for a binding right now.
    pub fn pen_for(&self, binding: &TrackBinding) -> Pen {
        if binding.shared {
            self.get(binding.track).map(|t| t.pen).unwrap_or(binding.pen)
        } else {
            binding.pen
        }
    }

    /// Applies `edit` to whichever pen is authoritative for the binding.
    pub fn edit_pen(&mut self, binding: &mut TrackBinding, edit: impl FnOnce(&mut Pen)) {
        if binding.shared {
            if let Some(track) = self.get_mut(binding.track) {
                edit(&mut track.pen);
                binding.pen = track.pen;
                return;
            }
        }
        edit(&mut binding.pen);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_issues_sequential_handles() {
        let mut store = TrackStore::new(7);
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        assert!(store.get(a).is_some());
        assert!(store.get(TrackId { stage: 8, idx: 0 }).is_none());
    }

    #[test]
    fn exclusive_binding_owns_its_pen() {
        let mut store = TrackStore::new(1);
        let track = store.create();
        let mut binding = TrackBinding::new(track, false, Point::ZERO);

        store.edit_pen(&mut binding, |pen| pen.color = Color::RED);

        assert_eq!(store.pen_for(&binding).color, Color::RED);
        assert_eq!(store.get(track).unwrap().pen.color, Color::BLACK);
    }

    #[test]
    fn shared_binding_writes_through_to_track() {
        let mut store = TrackStore::new(1);
        let track = store.create();
        let mut first = TrackBinding::new(track, true, Point::ZERO);
        let second = TrackBinding::new(track, true, Point::ZERO);

        store.edit_pen(&mut first, |pen| pen.width = 4);

        assert_eq!(store.pen_for(&second).width, 4);
        assert_eq!(store.get(track).unwrap().pen.width, 4);
    }
}
