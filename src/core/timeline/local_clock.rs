//=========================================================================
// Local Clock
//=========================================================================
//
// Turns the global tick into an entity's own, possibly slower, tick.
//
// Frame lifecycle: advance(interval) → [fire] → adopt_override(next)
//
//   frame_period == 0 && override == 0  → fire every global tick
//   otherwise                           → accumulate, fire once
//                                         elapsed ≥ max(period, override)
//
//=========================================================================

//=== LocalTick ===========================================================

/// A due local tick, handed to the entity's `local_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTick {
    /// Running frame counter before this tick incremented it.
    pub frame_count: u64,
    /// Milliseconds accumulated since the previous local tick.
    pub elapsed_ms: u64,
}

//=== LocalClock ==========================================================

/// Per-entity animation clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalClock {
    frame_period_ms: u64,
    frame_count: u64,
    elapsed_ms: u64,
    duration_override_ms: u64,
}

impl LocalClock {
    //--- Accessors --------------------------------------------------------

    pub fn frame_period_ms(&self) -> u64 {
        self.frame_period_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Changes the frame period. Accumulated time is kept.
    pub fn set_frame_period(&mut self, frame_period_ms: u64) {
        self.frame_period_ms = frame_period_ms;
    }

    //--- advance() --------------------------------------------------------
    //
    // Feeds one global tick of `interval_ms`. Returns the local tick if one
    // is due, after bumping the frame counter and resetting the
    // accumulator.
    //
    pub fn advance(&mut self, interval_ms: u64) -> Option<LocalTick> {
        if self.frame_period_ms == 0 && self.duration_override_ms == 0 {
            return Some(self.fire(interval_ms));
        }

        self.elapsed_ms += interval_ms;
        let threshold = self.frame_period_ms.max(self.duration_override_ms);
        if self.elapsed_ms < threshold {
            return None;
        }

        let elapsed_ms = self.elapsed_ms;
        Some(self.fire(elapsed_ms))
    }

    /// Adopts the frame duration the entity returned from its update.
    pub fn adopt_override(&mut self, next_duration_ms: u64) {
        self.duration_override_ms = next_duration_ms;
    }

    //--- Internal Helpers -------------------------------------------------

    fn fire(&mut self, elapsed_ms: u64) -> LocalTick {
        let tick = LocalTick {
            frame_count: self.frame_count,
            elapsed_ms,
        };
        self.frame_count += 1;
        self.elapsed_ms = 0;
        tick
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
