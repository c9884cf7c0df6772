//=========================================================================
// Registry
//=========================================================================
//
// Ownership and depth order for staged entities.
//
// Architecture:
//   Registry
//     ├─ slots: Vec<Slot>   (generational arena of Occupant)
//     └─ head               (ring entry point; head.prev is topmost)
//
// Flow:
//   insert() → walk(BackToFront) → renderer
//   walk(FrontToBack) → find_topmost_at() / find_least_recently_hit_at()
//
//=========================================================================

//=== Module Declarations =================================================

mod hit_test;
mod ring;

//=== Public API ==========================================================

pub use ring::Direction;

pub(crate) use ring::{Occupant, Registry};
