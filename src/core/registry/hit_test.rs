//=========================================================================
// Hit Testing
//=========================================================================
//
// Point queries over the ring, topmost first.
//
// Both queries walk from the tail (last painted) toward the head and skip
// hidden or concealed entities. The least-recently-hit query keeps the
// candidate with the smallest hit counter (ties go to the topmost) and
// bumps the winner's counter, so repeated clicks on a stack of
// overlapping entities cycle through all of them.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::Point;

//=== Internal Dependencies ===============================================

use super::ring::{Direction, Occupant, Registry};
use crate::core::entity::EntityId;

//=========================================================================

impl Registry {
    /// The topmost visible entity under `point`.
    pub fn find_topmost_at(&self, point: Point) -> Option<EntityId> {
        self.walk(Direction::FrontToBack)
            .into_iter()
            .find(|&id| self.occupant(id).is_some_and(|o| hits(o, point)))
    }

    /// The visible entity under `point` hit the fewest times so far.
    pub fn find_least_recently_hit_at(&mut self, point: Point) -> Option<EntityId> {
        let mut winner: Option<(EntityId, u32)> = None;

        for id in self.walk(Direction::FrontToBack) {
            let Some(occupant) = self.occupant(id) else {
                continue;
            };
            if !hits(occupant, point) {
                continue;
            }
            let count = occupant.info.selection_hit;
            if winner.map_or(true, |(_, best)| count < best) {
                winner = Some((id, count));
            }
        }

        let (id, _) = winner?;
        if let Some(info) = self.info_mut(id) {
            info.selection_hit = info.selection_hit.wrapping_add(1);
        }
        Some(id)
    }
}

fn hits(occupant: &Occupant, point: Point) -> bool {
    if !occupant.info.visible || occupant.behavior.is_concealed() {
        return false;
    }
    let local = point - occupant.info.position;
    occupant.behavior.contains(local.to_point())
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Entity;
    use kurbo::Rect;

    struct Square {
        concealed: bool,
    }

    impl Entity for Square {
        fn bounding_box(&self) -> Rect {
            Rect::new(0.0, 0.0, 10.0, 10.0)
        }

        fn is_concealed(&self) -> bool {
            self.concealed
        }
    }

    fn square() -> Box<Square> {
        Box::new(Square { concealed: false })
    }

    #[test]
    fn topmost_is_last_painted() {
        let mut registry = Registry::new(1);
        let a = registry.insert(square(), Point::new(0.0, 0.0));
        let b = registry.insert(square(), Point::new(5.0, 5.0));

        assert_eq!(registry.find_topmost_at(Point::new(7.0, 7.0)), Some(b));
        assert_eq!(registry.find_topmost_at(Point::new(2.0, 2.0)), Some(a));
        assert_eq!(registry.find_topmost_at(Point::new(50.0, 50.0)), None);

        registry.bring_to_front(a, None).unwrap();
        assert_eq!(registry.find_topmost_at(Point::new(7.0, 7.0)), Some(a));
    }

    #[test]
    fn hidden_and_concealed_are_skipped() {
        let mut registry = Registry::new(1);
        let a = registry.insert(square(), Point::ZERO);
        let b = registry.insert(square(), Point::ZERO);
        registry.insert(Box::new(Square { concealed: true }), Point::ZERO);

        registry.info_mut(b).unwrap().visible = false;
        assert_eq!(registry.find_topmost_at(Point::new(1.0, 1.0)), Some(a));
    }

    #[test]
    fn least_recently_hit_cycles_through_stack() {
        let mut registry = Registry::new(1);
        let a = registry.insert(square(), Point::ZERO);
        let b = registry.insert(square(), Point::ZERO);
        let c = registry.insert(square(), Point::ZERO);
        let at = Point::new(3.0, 3.0);

        let picks: Vec<EntityId> = (0..6)
            .filter_map(|_| registry.find_least_recently_hit_at(at))
            .collect();

        assert_eq!(picks, vec![c, b, a, c, b, a]);
    }

    #[test]
    fn least_recently_hit_misses_empty_space() {
        let mut registry = Registry::new(1);
        registry.insert(square(), Point::ZERO);
        assert_eq!(
            registry.find_least_recently_hit_at(Point::new(-1.0, -1.0)),
            None
        );
    }
}
