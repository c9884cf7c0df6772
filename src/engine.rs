//=========================================================================
// Tableau Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Tick Loop]
//         │                          │
//         ├─ with_tps()              ├─ init(|stage| ...)
//         ├─ with_tick_length()      ├─ events()  (StageEvent receiver)
//         ├─ with_scene_bounds()     └─ run(shutdown)
//         └─ with_channel_capacity()      blocks until shutdown
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use kurbo::Rect;
use log::info;

//=== Internal Dependencies ===============================================

use crate::core::stage::{Stage, StageConfig, StageEvent};
use crate::core::TickDriver;

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (17ms ticks)
/// - **Scene bounds**: none (no border checks)
/// - **Channel capacity**: 128 events
///
/// # Examples
///
/// ```no_run
/// use tableau_engine::prelude::*;
///
/// let (_stop, shutdown) = crossbeam_channel::bounded::<()>(1);
///
/// EngineBuilder::new()
///     .with_tps(30.0)
///     .with_scene_bounds(Rect::new(0.0, 0.0, 480.0, 360.0))
///     .build()
///     .init(|stage| {
///         // stage.insert(...);
///         let _ = stage;
///     })
///     .run(&shutdown);
/// ```
pub struct EngineBuilder {
    tick_length: Duration,
    scene_bounds: Option<Rect>,
    channel_capacity: usize,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            tick_length: Duration::from_secs_f64(1.0 / 60.0),
            scene_bounds: None,
            channel_capacity: 128,
        }
    }

    /// Sets the tick rate in ticks per second.
    ///
    /// Glide step counts and local clocks are derived from the resulting
    /// tick length, rounded to whole milliseconds.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tick_length = Duration::from_secs_f64(1.0 / tps);
        self
    }

    /// Sets the tick length directly.
    ///
    /// # Panics
    ///
    /// Panics if `tick_length` is zero.
    pub fn with_tick_length(mut self, tick_length: Duration) -> Self {
        assert!(!tick_length.is_zero(), "Tick length must be positive");
        self.tick_length = tick_length;
        self
    }

    /// Enables border checks against `bounds`.
    pub fn with_scene_bounds(mut self, bounds: Rect) -> Self {
        self.scene_bounds = Some(bounds);
        self
    }

    /// Sets the capacity of the stage event channel.
    ///
    /// Events that do not fit are dropped with a warning.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Builds the engine and its stage.
    pub fn build(self) -> Engine {
        let tick_length_ms = tick_millis(self.tick_length);
        info!(
            "Building engine (tick: {}ms, channel: {})",
            tick_length_ms, self.channel_capacity
        );

        let (tx, rx) = bounded(self.channel_capacity);
        let stage = Stage::new(StageConfig {
            tick_length_ms,
            scene_bounds: self.scene_bounds,
            events: Some(tx),
        });

        Engine {
            stage,
            events: rx,
            channel_capacity: self.channel_capacity,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Whole milliseconds, never zero.
fn tick_millis(tick_length: Duration) -> u64 {
    ((tick_length.as_secs_f64() * 1000.0).round() as u64).max(1)
}

//=== Engine ==============================================================

/// Tableau Engine runtime: one stage plus the loop that ticks it.
///
/// Create via [`EngineBuilder`] with `EngineBuilder::new().build()`.
pub struct Engine {
    stage: Stage,
    events: Receiver<StageEvent>,
    channel_capacity: usize,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// Populates the stage before execution.
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut Stage),
    {
        info!("Initializing stage");
        init_fn(&mut self.stage);
        info!("Stage initialization complete ({} entities)", self.stage.len());
        self
    }

    //--- Accessors --------------------------------------------------------

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Receiving end of the stage event channel.
    pub fn events(&self) -> &Receiver<StageEvent> {
        &self.events
    }

    //--- Execution --------------------------------------------------------

    /// Ticks the stage at the configured rate until `shutdown` receives a
    /// message or disconnects. Returns the number of ticks run.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> u64 {
        let tick_length = Duration::from_millis(self.stage.tick_length_ms());
        info!(
            "Starting engine runtime (tick: {:?}, channel: {})",
            tick_length, self.channel_capacity
        );

        let ticks = TickDriver::every(tick_length).run(&mut self.stage, shutdown);

        info!("Engine shutdown complete");
        ticks
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::fixtures::Probe;
    use kurbo::Point;
    use std::thread;

    //=====================================================================
    // EngineBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = EngineBuilder::new();
        assert_eq!(tick_millis(builder.tick_length), 17);
        assert_eq!(builder.channel_capacity, 128);
        assert_eq!(builder.scene_bounds, None);
    }

    #[test]
    fn builder_with_tps() {
        let engine = EngineBuilder::new().with_tps(10.0).build();
        assert_eq!(engine.stage().tick_length_ms(), 100);
    }

    #[test]
    fn very_high_tps_rounds_up_to_one_millisecond() {
        let engine = EngineBuilder::new().with_tps(5000.0).build();
        assert_eq!(engine.stage().tick_length_ms(), 1);
    }

    #[test]
    #[should_panic(expected = "TPS must be positive")]
    fn builder_with_tps_panics_on_zero() {
        EngineBuilder::new().with_tps(0.0);
    }

    #[test]
    #[should_panic(expected = "TPS must be positive")]
    fn builder_with_tps_panics_on_negative() {
        EngineBuilder::new().with_tps(-60.0);
    }

    #[test]
    #[should_panic(expected = "Tick length must be positive")]
    fn builder_with_zero_tick_length_panics() {
        EngineBuilder::new().with_tick_length(Duration::ZERO);
    }

    #[test]
    #[should_panic(expected = "Channel capacity must be positive")]
    fn builder_with_channel_capacity_panics_on_zero() {
        EngineBuilder::new().with_channel_capacity(0);
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let bounds = Rect::new(0.0, 0.0, 480.0, 360.0);
        let engine = EngineBuilder::new()
            .with_tick_length(Duration::from_millis(40))
            .with_scene_bounds(bounds)
            .with_channel_capacity(256)
            .build();

        assert_eq!(engine.stage().tick_length_ms(), 40);
        assert_eq!(engine.stage().scene_bounds(), Some(bounds));
        assert_eq!(engine.channel_capacity, 256);
    }

    //=====================================================================
    // Engine Tests
    //=====================================================================

    #[test]
    fn init_populates_stage_and_events_flow() {
        let engine = EngineBuilder::new().build().init(|stage| {
            stage.insert(Probe::boxed().0, Point::ZERO);
        });

        assert_eq!(engine.stage().len(), 1);
        assert_eq!(engine.events().try_recv(), Ok(StageEvent::Repaint));
    }

    #[test]
    fn run_returns_when_shutdown_disconnects() {
        let mut engine = EngineBuilder::new().build();
        let (stop, shutdown) = bounded::<()>(1);
        drop(stop);

        assert_eq!(engine.run(&shutdown), 0);
    }

    #[test]
    fn run_ticks_until_shutdown() {
        let mut engine = EngineBuilder::new()
            .with_tick_length(Duration::from_millis(2))
            .build();
        let (stop, shutdown) = bounded::<()>(1);
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            stop.send(()).unwrap();
        });

        let ticks = engine.run(&shutdown);
        stopper.join().unwrap();

        assert_eq!(engine.stage().uptime_ms(), ticks * 2);
    }
}
