//=========================================================================
// Tableau Engine — Library Root
//
// This crate defines the public API surface of the Tableau Engine.
//
// Responsibilities:
// - Expose the engine facade (`Engine`, `EngineBuilder`)
// - Expose the `Stage` and its subsystems for hosts that drive ticks
//   themselves
// - Keep rendering, input and asset handling outside: entities describe
//   themselves through the `Entity` trait and the host paints them in
//   `Stage::paint_order()`
//
// Typical usage:
// ```no_run
// use tableau_engine::prelude::*;
//
// let (_stop, shutdown) = crossbeam_channel::bounded::<()>(1);
// EngineBuilder::new().build().run(&shutdown);
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the stage and every subsystem it is built from
// (registry, motion, timeline, overlays, tracks).
//
// `prelude` re-exports the types most hosts need.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the main engine entry point and tick loop setup.
//
mod engine;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the engine facade so hosts can simply
// `use tableau_engine::{Engine, EngineBuilder};`.
//
pub use engine::{Engine, EngineBuilder};
