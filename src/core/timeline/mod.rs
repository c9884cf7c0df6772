//=========================================================================
// Timeline Multiplexer
//=========================================================================
//
// One global tick in, zero or one local tick out per entity.
//
// Architecture:
//   SceneClock (global, fixed tick length, uptime)
//       ↓ interval
//   LocalClock (per entity: period, override, frame counter)
//       ↓ Option<LocalTick>
//   Entity::local_update() → next duration override
//
//=========================================================================

//=== Module Declarations =================================================

mod local_clock;

//=== Public API ==========================================================

pub use local_clock::{LocalClock, LocalTick};

//=== SceneClock ==========================================================

/// The stage's global clock: a fixed tick length and the uptime it
/// accumulates, both in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneClock {
    tick_length_ms: u64,
    uptime_ms: u64,
}

impl SceneClock {
    /// Creates a clock at uptime zero.
    ///
    /// # Panics
    ///
    /// Panics if `tick_length_ms == 0`.
    pub fn new(tick_length_ms: u64) -> Self {
        assert!(tick_length_ms > 0, "Tick length must be positive");
        Self {
            tick_length_ms,
            uptime_ms: 0,
        }
    }

    pub fn tick_length_ms(&self) -> u64 {
        self.tick_length_ms
    }

    pub fn uptime_ms(&self) -> u64 {
        self.uptime_ms
    }

    /// Advances by one tick and returns the new uptime.
    pub fn advance(&mut self) -> u64 {
        self.uptime_ms += self.tick_length_ms;
        self.uptime_ms
    }

    /// Number of whole ticks a glide of `seconds` spans (at least one).
    pub fn steps_for(&self, seconds: f64) -> u32 {
        let steps = (seconds * 1000.0 / self.tick_length_ms as f64).floor();
        if steps < 1.0 {
            1
        } else if steps > u32::MAX as f64 {
            u32::MAX
        } else {
            steps as u32
        }
    }

    /// Absolute uptime `seconds` from now, saturating at `u64::MAX`.
    pub fn deadline_after(&self, seconds: f64) -> u64 {
        let delay_ms = (seconds * 1000.0).round().max(0.0) as u64;
        self.uptime_ms.saturating_add(delay_ms)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_uptime() {
        let mut clock = SceneClock::new(100);
        clock.advance();
        assert_eq!(clock.advance(), 200);
        assert_eq!(clock.uptime_ms(), 200);
    }

    #[test]
    fn steps_floor_with_minimum_of_one() {
        let clock = SceneClock::new(100);
        assert_eq!(clock.steps_for(1.0), 10);
        assert_eq!(clock.steps_for(1.05), 10);
        assert_eq!(clock.steps_for(0.05), 1);
        assert_eq!(clock.steps_for(0.0), 1);
    }

    #[test]
    fn deadline_is_relative_to_uptime() {
        let mut clock = SceneClock::new(50);
        clock.advance();
        assert_eq!(clock.deadline_after(1.5), 1550);
    }

    #[test]
    fn far_deadlines_saturate() {
        let mut clock = SceneClock::new(50);
        clock.advance();
        assert_eq!(clock.deadline_after(1e300), u64::MAX);
        assert_eq!(clock.deadline_after(f64::INFINITY), u64::MAX);
    }

    #[test]
    #[should_panic(expected = "Tick length must be positive")]
    fn zero_tick_length_panics() {
        SceneClock::new(0);
    }
}
