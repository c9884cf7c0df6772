//=========================================================================
// Selection & Hit Testing
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::Point;

//=== Internal Dependencies ===============================================

use super::{Stage, StageEvent};
use crate::core::entity::EntityId;
use crate::core::outcome::NoOp;

impl Stage {
    //--- Selection --------------------------------------------------------

    /// Marks `entity` as selected. `false` if it already was.
    pub fn select(&mut self, entity: EntityId) -> bool {
        self.set_selected(entity, true)
    }

    /// Clears `entity`'s selection mark. `false` if it was not selected.
    pub fn deselect(&mut self, entity: EntityId) -> bool {
        self.set_selected(entity, false)
    }

    /// Flips the selection mark and returns the new state.
    pub fn toggle_selection(&mut self, entity: EntityId) -> Option<bool> {
        let selected = !self.is_selected(entity)?;
        self.set_selected(entity, selected);
        Some(selected)
    }

    /// Deselects everything, inside one update sequence.
    pub fn clear_selection(&mut self) {
        let selected = self.selected();
        self.update_sequence(|stage| {
            for entity in selected {
                stage.deselect(entity);
            }
        });
    }

    pub fn is_selected(&self, entity: EntityId) -> Option<bool> {
        self.registry.info(entity).map(|info| info.selected)
    }

    /// Selected entities in paint order.
    pub fn selected(&self) -> Vec<EntityId> {
        self.paint_order()
            .into_iter()
            .filter(|id| self.is_selected(*id) == Some(true))
            .collect()
    }

    //--- Hit Testing ------------------------------------------------------

    /// The topmost visible, unconcealed entity containing `point`.
    pub fn find_topmost_at(&self, point: Point) -> Option<EntityId> {
        self.registry.find_topmost_at(point)
    }

    /// Among entities containing `point`, the one hit least often by this
    /// query so far (topmost on ties). Repeated clicks on a stack cycle
    /// through it.
    pub fn find_least_recently_hit_at(&mut self, point: Point) -> Option<EntityId> {
        self.registry.find_least_recently_hit_at(point)
    }

    //--- Internal Helpers -------------------------------------------------

    fn set_selected(&mut self, entity: EntityId, selected: bool) -> bool {
        let result = match self.registry.info_mut(entity) {
            Some(info) if info.selected == selected => Err(NoOp::SelectionUnchanged),
            Some(info) => {
                info.selected = selected;
                Ok(())
            }
            None => Err(NoOp::UnownedHandle),
        };
        if result.is_ok() {
            self.emit(StageEvent::SelectionChanged { entity, selected });
            self.request_repaint();
        }
        self.conclude(if selected { "select" } else { "deselect" }, result)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
