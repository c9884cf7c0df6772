//=========================================================================
// Glide
//=========================================================================
//
// Step-interpolated motion toward a fixed target.
//
// A glide of `n` steps moves by `(target - start) / n` per global tick.
// It finishes on the tick where `step_index` reaches `total_steps`, or
// earlier if a step would carry the entity past the target on either
// axis; either way the final position is the exact target.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::{Point, Vec2};

//=== MotionState =========================================================

/// What an entity's motion engine is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionState {
    /// Nothing in flight, nothing queued.
    Idle,

    /// A glide is in flight.
    Gliding(Glide),

    /// No glide in flight, but queued commands remain; one is replayed per
    /// tick until the queue is empty.
    Draining,
}

//=== GlideStep ===========================================================

/// Result of advancing a glide by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlideStep {
    pub position: Point,
    pub progress: f64,
    pub finished: bool,
}

//=== Glide ===============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glide {
    target: Point,
    speed: Vec2,
    step_index: u32,
    total_steps: u32,
}

impl Glide {
    /// Plans a glide from `from` to `target` over `steps` ticks.
    pub fn start(from: Point, target: Point, steps: u32) -> Self {
        let total_steps = steps.max(1);
        Self {
            target,
            speed: (target - from) / total_steps as f64,
            step_index: 0,
            total_steps,
        }
    }

    pub fn step_index(&self) -> u32 {
        self.step_index
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Fraction of the glide completed so far.
    pub fn progress(&self) -> f64 {
        self.step_index as f64 / self.total_steps as f64
    }

    //--- step() -----------------------------------------------------------
    //
    // Advances one tick from `from`. The index reaches `total_steps` only on
    // the finishing step (last step or overstep), which returns the target
    // verbatim. The reported progress is the index after the step.
    //
    pub fn step(&mut self, from: Point) -> GlideStep {
        let next = from + self.speed;
        self.step_index += 1;

        if self.step_index >= self.total_steps || self.oversteps(next) {
            self.step_index = self.total_steps;
            return GlideStep {
                position: self.target,
                progress: 1.0,
                finished: true,
            };
        }

        GlideStep {
            position: next,
            progress: self.progress(),
            finished: false,
        }
    }

    /// Completes the glide immediately.
    pub fn finish(&mut self) -> Point {
        self.step_index = self.total_steps;
        self.target
    }

    //--- Internal Helpers -------------------------------------------------

    // The remaining distance points against the direction of travel.
    fn oversteps(&self, next: Point) -> bool {
        let remaining = self.target - next;
        (self.speed.x != 0.0 && remaining.x * self.speed.x < 0.0)
            || (self.speed.y != 0.0 && remaining.y * self.speed.y < 0.0)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
