//=========================================================================
// Core Systems
//
// The scene engine proper and the loop that drives it.
//
// Responsibilities:
// - Own every subsystem a stage is built from (registry, motion,
//   timeline, overlays, tracks)
// - Advance a stage once per fixed-period tick
// - Stop cleanly when the host signals shutdown
//
// Notes:
// Everything runs on the calling thread. The tick source is a crossbeam
// channel of instants (normally `crossbeam_channel::tick`), so tests can
// feed ticks by hand and the host can swap in its own timer.
//
//=========================================================================

//=== Standard Library Imports ============================================
use std::time::{Duration, Instant};

//=== External Crates =====================================================
use crossbeam_channel::{select, tick, Receiver};
use log::{debug, info};

//=== Internal Modules ====================================================
use stage::Stage;

pub mod entity;
pub mod motion;
pub mod outcome;
pub mod overlay;
pub mod registry;
pub mod stage;
pub mod timeline;
pub mod track;

//=== TickControl =========================================================
//
// Defines control flow for the tick loop.
// Each wait can signal either to tick once more or terminate the loop.
//
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== TickDriver ==========================================================
//
// Turns a stream of timer instants into `Stage::tick` calls.
//
pub struct TickDriver {
    ticks: Receiver<Instant>,
}

impl TickDriver {
    //--- Construction -----------------------------------------------------

    /// Drives from an existing tick source.
    pub fn new(ticks: Receiver<Instant>) -> Self {
        Self { ticks }
    }

    /// Drives from a fixed-period timer.
    pub fn every(period: Duration) -> Self {
        Self::new(tick(period))
    }

    //--- run() ------------------------------------------------------------
    //
    // Ticks `stage` once per received instant until `shutdown` receives a
    // message or disconnects, or the tick source disconnects. Returns the
    // number of ticks run.
    //
    pub fn run(&self, stage: &mut Stage, shutdown: &Receiver<()>) -> u64 {
        info!("Tick loop started ({}ms ticks)", stage.tick_length_ms());
        let mut count = 0;

        while let TickControl::Continue = self.wait(shutdown) {
            stage.tick();
            count += 1;
        }

        info!("Tick loop exited after {} ticks", count);
        count
    }

    //--- wait() -----------------------------------------------------------
    //
    // Blocks until the next tick or a shutdown signal.
    //
    fn wait(&self, shutdown: &Receiver<()>) -> TickControl {
        select! {
            recv(shutdown) -> _ => {
                debug!("Shutdown signal received");
                TickControl::Exit
            }
            recv(self.ticks) -> instant => match instant {
                Ok(_) => TickControl::Continue,
                Err(_) => {
                    debug!("Tick source disconnected");
                    TickControl::Exit
                }
            },
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn runs_one_stage_tick_per_instant() {
        let (tick_tx, tick_rx) = unbounded();
        let (_shutdown_tx, shutdown_rx) = unbounded::<()>();
        for _ in 0..3 {
            tick_tx.send(Instant::now()).unwrap();
        }
        drop(tick_tx);

        let mut stage = Stage::default();
        let ticks = TickDriver::new(tick_rx).run(&mut stage, &shutdown_rx);

        assert_eq!(ticks, 3);
        assert_eq!(stage.uptime_ms(), 3 * stage.tick_length_ms());
    }

    #[test]
    fn shutdown_stops_before_ticking() {
        let (_tick_tx, tick_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = unbounded();
        shutdown_tx.send(()).unwrap();

        let mut stage = Stage::default();
        assert_eq!(TickDriver::new(tick_rx).run(&mut stage, &shutdown_rx), 0);
        assert_eq!(stage.uptime_ms(), 0);
    }

    #[test]
    fn dropped_shutdown_sender_stops_loop() {
        let (shutdown_tx, shutdown_rx) = unbounded::<()>();
        drop(shutdown_tx);

        let mut stage = Stage::default();
        let driver = TickDriver::every(Duration::from_secs(3600));
        assert_eq!(driver.run(&mut stage, &shutdown_rx), 0);
    }
}
