//=========================================================================
// Entity Lifecycle & Depth Order
//=========================================================================
//
// Insertion, removal and reordering on the stage.
//
// Every mutation invalidates cached bounds and requests a repaint.
// Removal also releases the entity's overlay reference and drops it from
// the selection, so no owner record outlives its entity.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::{Point, Vec2};
use log::debug;

//=== Internal Dependencies ===============================================

use super::{Stage, StageEvent};
use crate::core::entity::{Entity, EntityId};
use crate::core::outcome::NoOp;

//=== Removal =============================================================

/// What happened to a removed entity.
pub enum Removal {
    /// The entity was dropped.
    Destroyed,
    /// The entity was handed back to the caller.
    Released(Box<dyn Entity>),
}

impl std::fmt::Debug for Removal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Removal::Destroyed => write!(f, "Destroyed"),
            Removal::Released(_) => write!(f, "Released(..)"),
        }
    }
}

impl Stage {
    //--- Insertion --------------------------------------------------------

    /// Places an entity with its local origin at `position`.
    ///
    /// The newest entity is painted last (topmost).
    pub fn insert(&mut self, entity: Box<dyn Entity>, position: Point) -> EntityId {
        let id = self.registry.insert(entity, position);
        debug!("Inserted {:?} at {:?}", id, position);
        self.invalidate();
        id
    }

    /// Places an entity so that `anchor` (normalized over its bounding
    /// box, `(0.5, 0.5)` = center) lands on `position + offset`.
    pub fn insert_at(
        &mut self,
        entity: Box<dyn Entity>,
        position: Point,
        anchor: Point,
        offset: Vec2,
    ) -> EntityId {
        let bbox = entity.bounding_box();
        let anchor_offset = Vec2::new(
            bbox.x0 + anchor.x * bbox.width(),
            bbox.y0 + anchor.y * bbox.height(),
        );
        self.insert(entity, position - anchor_offset + offset)
    }

    //--- Removal ----------------------------------------------------------

    /// Removes an entity from the stage.
    ///
    /// With `destroy`, the entity is dropped; otherwise it is handed back.
    /// Returns `None` if the stage does not own `entity`.
    pub fn remove(&mut self, entity: EntityId, destroy: bool) -> Option<Removal> {
        let occupant = match self.registry.remove(entity) {
            Ok(occupant) => occupant,
            Err(reason) => {
                self.conclude("remove", Err(reason));
                return None;
            }
        };

        if let Some(attachment) = occupant.info.overlay {
            self.release_overlay(attachment.overlay);
        }
        if occupant.info.selected {
            self.emit(StageEvent::SelectionChanged {
                entity,
                selected: false,
            });
        }
        debug!(
            "Removed {:?} ({} pending commands dropped)",
            entity,
            occupant.info.pending.len()
        );
        self.invalidate();
        self.flush_requests();

        if destroy {
            Some(Removal::Destroyed)
        } else {
            Some(Removal::Released(occupant.behavior))
        }
    }

    //--- Depth Order ------------------------------------------------------

    /// Paints `entity` just above `target`, or above everything.
    pub fn bring_to_front(&mut self, entity: EntityId, target: Option<EntityId>) -> bool {
        let result = self.registry.bring_to_front(entity, target);
        self.reordered("bring_to_front", result)
    }

    /// Paints `entity` up to `n` places higher.
    pub fn bring_forward(&mut self, entity: EntityId, n: usize) -> bool {
        let result = self.registry.bring_forward(entity, n);
        self.reordered("bring_forward", result)
    }

    /// Paints `entity` just below `target`, or below everything.
    pub fn send_to_back(&mut self, entity: EntityId, target: Option<EntityId>) -> bool {
        let result = self.registry.send_to_back(entity, target);
        self.reordered("send_to_back", result)
    }

    /// Paints `entity` up to `n` places lower.
    pub fn send_backward(&mut self, entity: EntityId, n: usize) -> bool {
        let result = self.registry.send_backward(entity, n);
        self.reordered("send_backward", result)
    }

    //--- Flags ------------------------------------------------------------

    /// Shows or hides an entity. Hidden entities are not hit-tested.
    pub fn set_visible(&mut self, entity: EntityId, visible: bool) -> bool {
        let result = match self.registry.info_mut(entity) {
            Some(info) => {
                info.visible = visible;
                Ok(())
            }
            None => Err(NoOp::UnownedHandle),
        };
        if result.is_ok() {
            self.invalidate();
        }
        self.conclude("set_visible", result)
    }

    /// Marks an entity as transient (tooltip-like): its motion never
    /// queues behind a glide and it never draws on a track.
    pub fn set_transient(&mut self, entity: EntityId, transient: bool) -> bool {
        let result = match self.registry.info_mut(entity) {
            Some(info) => {
                info.transient = transient;
                Ok(())
            }
            None => Err(NoOp::UnownedHandle),
        };
        self.conclude("set_transient", result)
    }

    pub fn is_transient(&self, entity: EntityId) -> Option<bool> {
        self.registry.info(entity).map(|info| info.transient)
    }

    //--- Local Clock ------------------------------------------------------

    /// Sets how often the entity's local clock fires (0 = every tick).
    pub fn set_frame_period(&mut self, entity: EntityId, frame_period_ms: u64) -> bool {
        let result = match self.registry.info_mut(entity) {
            Some(info) => {
                info.clock.set_frame_period(frame_period_ms);
                Ok(())
            }
            None => Err(NoOp::UnownedHandle),
        };
        self.conclude("set_frame_period", result)
    }

    pub fn frame_period(&self, entity: EntityId) -> Option<u64> {
        self.registry
            .info(entity)
            .map(|info| info.clock.frame_period_ms())
    }

    /// Local frames the entity has been given so far.
    pub fn frame_count(&self, entity: EntityId) -> Option<u64> {
        self.registry.info(entity).map(|info| info.clock.frame_count())
    }

    //--- Internal Helpers -------------------------------------------------

    fn reordered(&mut self, operation: &str, result: Result<(), NoOp>) -> bool {
        if result.is_ok() {
            self.invalidate();
        }
        self.conclude(operation, result)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::fixtures::Probe;
    use crate::core::stage::StageConfig;
    use crossbeam_channel::bounded;

    #[test]
    fn insert_at_resolves_anchor_and_offset() {
        let mut stage = Stage::default();
        let (probe, _) = Probe::boxed();
        let id = stage.insert_at(
            probe,
            Point::new(50.0, 50.0),
            Point::new(0.5, 0.5),
            Vec2::new(1.0, -1.0),
        );
        assert_eq!(stage.position(id), Some(Point::new(46.0, 44.0)));
        assert_eq!(
            stage.scene_box(id),
            Some(kurbo::Rect::new(46.0, 44.0, 56.0, 54.0))
        );
    }

    #[test]
    fn remove_releases_or_destroys() {
        let mut stage = Stage::default();
        let (a, _) = Probe::boxed();
        let (b, _) = Probe::boxed();
        let a = stage.insert(a, Point::ZERO);
        let b = stage.insert(b, Point::ZERO);

        assert!(matches!(stage.remove(a, false), Some(Removal::Released(_))));
        assert!(matches!(stage.remove(b, true), Some(Removal::Destroyed)));
        assert!(stage.remove(a, true).is_none());
        assert!(stage.is_empty());
    }

    #[test]
    fn released_entity_can_be_reinserted() {
        let mut stage = Stage::default();
        let (probe, _) = Probe::boxed();
        let first = stage.insert(probe, Point::ZERO);
        let Some(Removal::Released(entity)) = stage.remove(first, false) else {
            panic!("expected entity back");
        };

        let second = stage.insert(entity, Point::new(3.0, 3.0));
        assert_ne!(first, second);
        assert!(!stage.contains(first));
        assert!(stage.contains(second));
    }

    #[test]
    fn removing_selected_entity_reports_deselection() {
        let (tx, rx) = bounded(16);
        let mut stage = Stage::new(StageConfig {
            events: Some(tx),
            ..StageConfig::default()
        });
        let (probe, _) = Probe::boxed();
        let id = stage.insert(probe, Point::ZERO);
        stage.select(id);
        rx.try_iter().count();

        stage.remove(id, true);
        let events: Vec<StageEvent> = rx.try_iter().collect();
        assert!(events.contains(&StageEvent::SelectionChanged {
            entity: id,
            selected: false
        }));
    }

    #[test]
    fn reorder_with_foreign_handle_is_noop() {
        let mut stage = Stage::default();
        let mut other = Stage::default();
        let (a, _) = Probe::boxed();
        let (b, _) = Probe::boxed();
        let a = stage.insert(a, Point::ZERO);
        let foreign = other.insert(b, Point::ZERO);

        let before = stage.paint_order();
        assert!(!stage.bring_to_front(foreign, None));
        assert!(!stage.send_to_back(a, Some(foreign)));
        assert!(!stage.bring_to_front(a, Some(a)));
        assert_eq!(stage.paint_order(), before);
    }

    #[test]
    fn reorders_change_paint_order() {
        let mut stage = Stage::default();
        let ids: Vec<EntityId> = (0..3)
            .map(|_| stage.insert(Probe::boxed().0, Point::ZERO))
            .collect();

        assert!(stage.send_to_back(ids[2], None));
        assert_eq!(stage.paint_order(), vec![ids[2], ids[0], ids[1]]);
        assert!(stage.bring_forward(ids[2], 1));
        assert_eq!(stage.paint_order(), vec![ids[0], ids[2], ids[1]]);
        assert!(stage.send_backward(ids[1], 2));
        assert_eq!(stage.paint_order(), vec![ids[1], ids[0], ids[2]]);
        assert_eq!(stage.next_in_order(ids[2]), Some(ids[1]));
        assert_eq!(stage.prev_in_order(ids[1]), Some(ids[2]));
    }
}
