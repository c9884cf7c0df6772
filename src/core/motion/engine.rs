//=========================================================================
// Motion Engine
//=========================================================================
//
// Instant, heading-relative and gliding motion on the stage.
//
// Flow:
//   public call → submit() ──busy──→ CommandQueue (replayed later)
//                          └─idle──→ apply_command()
//                                     ├─ Move / Advance → execute_move()
//                                     │     ├─ duration 0 → place()
//                                     │     └─ duration > 0 → Glide
//                                     └─ pen / heading / stamp
//
// Every tick, advance_motion() steps the glide in flight regardless of
// the entity's local clock. A finished glide replays exactly one queued
// command; further queued commands drain one per tick.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::{Point, Rect, Vec2};
use log::trace;

//=== Internal Dependencies ===============================================

use super::{to_radians, Glide, MotionCommand, MotionState, MoveTarget};
use crate::core::entity::EntityId;
use crate::core::outcome::{settle, NoOp};
use crate::core::stage::Stage;

impl Stage {
    //=====================================================================
    // Public Motion API
    //=====================================================================

    /// Moves `length` along the current heading, instantly.
    pub fn move_forward(&mut self, entity: EntityId, length: f64) -> bool {
        self.submit(
            entity,
            MotionCommand::Advance {
                length,
                duration: 0.0,
            },
        )
    }

    /// Glides `length` along the current heading over `seconds`.
    pub fn glide(&mut self, entity: EntityId, length: f64, seconds: f64) -> bool {
        self.submit(
            entity,
            MotionCommand::Advance {
                length,
                duration: seconds,
            },
        )
    }

    /// Moves by a displacement, instantly.
    pub fn move_by(&mut self, entity: EntityId, delta: Vec2) -> bool {
        self.submit(
            entity,
            MotionCommand::Move {
                target: MoveTarget::Relative(delta),
                duration: 0.0,
                update_heading: false,
            },
        )
    }

    /// Glides by a displacement over `seconds`.
    pub fn glide_by(&mut self, entity: EntityId, delta: Vec2, seconds: f64) -> bool {
        self.submit(
            entity,
            MotionCommand::Move {
                target: MoveTarget::Relative(delta),
                duration: seconds,
                update_heading: false,
            },
        )
    }

    /// Moves to an absolute position, instantly.
    ///
    /// With `update_heading`, the entity turns to face the direction of
    /// travel.
    pub fn move_to(&mut self, entity: EntityId, target: Point, update_heading: bool) -> bool {
        self.submit(
            entity,
            MotionCommand::Move {
                target: MoveTarget::Absolute(target),
                duration: 0.0,
                update_heading,
            },
        )
    }

    /// Glides to an absolute position over `seconds`.
    pub fn glide_to(
        &mut self,
        entity: EntityId,
        target: Point,
        seconds: f64,
        update_heading: bool,
    ) -> bool {
        self.submit(
            entity,
            MotionCommand::Move {
                target: MoveTarget::Absolute(target),
                duration: seconds,
                update_heading,
            },
        )
    }

    /// Sets the absolute heading (0 = +x, clockwise in screen space).
    pub fn set_heading(&mut self, entity: EntityId, value: f64, is_radian: bool) -> bool {
        self.submit(entity, MotionCommand::Heading { value, is_radian })
    }

    /// Turns relative to the current heading.
    pub fn turn(&mut self, entity: EntityId, value: f64, is_radian: bool) -> bool {
        self.submit(entity, MotionCommand::Rotation { value, is_radian })
    }

    //--- submit() ---------------------------------------------------------
    //
    // Single entry point for every motion, heading and pen request. Runs
    // the command now, or queues it behind the glide in flight. Transient
    // entities never queue.
    //
    pub fn submit(&mut self, entity: EntityId, command: MotionCommand) -> bool {
        let result = self.submit_inner(entity, command);
        self.conclude("motion", result)
    }

    /// Drops queued commands. With `finish`, a glide in flight snaps to its
    /// target and completes; otherwise it stops where it is.
    pub fn clear_pending_motion(&mut self, entity: EntityId, finish: bool) -> bool {
        let result = self.clear_pending_inner(entity, finish);
        self.conclude("clear_pending_motion", result)
    }

    //--- Queries ----------------------------------------------------------

    /// Heading in radians.
    pub fn heading(&self, entity: EntityId) -> Option<f64> {
        self.registry.info(entity).map(|info| info.heading)
    }

    pub fn is_gliding(&self, entity: EntityId) -> Option<bool> {
        self.registry
            .info(entity)
            .map(|info| matches!(info.motion, MotionState::Gliding(_)))
    }

    /// Progress of the glide in flight, `None` when not gliding.
    pub fn glide_progress(&self, entity: EntityId) -> Option<f64> {
        match self.registry.info(entity)?.motion {
            MotionState::Gliding(glide) => Some(glide.progress()),
            _ => None,
        }
    }

    /// Commands waiting behind the glide in flight, oldest first.
    pub fn pending_commands(&self, entity: EntityId) -> Option<Vec<MotionCommand>> {
        self.registry
            .info(entity)
            .map(|info| info.pending.iter().copied().collect())
    }

    //=====================================================================
    // Engine Internals
    //=====================================================================

    fn submit_inner(&mut self, entity: EntityId, command: MotionCommand) -> Result<(), NoOp> {
        let info = self.registry.info_mut(entity).ok_or(NoOp::UnownedHandle)?;
        if is_degenerate(&command) {
            return Err(NoOp::DegenerateMotion);
        }

        if info.is_busy() && !info.transient {
            info.pending.push(command);
            trace!(
                "Queued {:?} for {:?} ({} waiting)",
                command,
                entity,
                info.pending.len()
            );
            return Ok(());
        }
        self.apply_command(entity, command)
    }

    fn apply_command(&mut self, entity: EntityId, command: MotionCommand) -> Result<(), NoOp> {
        let info = self.registry.info_mut(entity).ok_or(NoOp::UnownedHandle)?;
        match command {
            MotionCommand::Move {
                target,
                duration,
                update_heading,
            } => {
                let to = target.destination(info.position);
                self.execute_move(entity, to, duration, update_heading)
            }
            MotionCommand::Advance { length, duration } => {
                let to = info.position + Vec2::from_angle(info.heading) * length;
                self.execute_move(entity, to, duration, false)
            }
            MotionCommand::Heading { value, is_radian } => {
                info.heading = to_radians(value, is_radian);
                self.request_repaint();
                Ok(())
            }
            MotionCommand::Rotation { value, is_radian } => {
                info.heading += to_radians(value, is_radian);
                self.request_repaint();
                Ok(())
            }
            MotionCommand::TrackReset => self.reset_bound_track(entity),
            MotionCommand::TrackDrawing(drawing) => {
                self.edit_pen(entity, |pen| pen.drawing = drawing)
            }
            MotionCommand::PenWidth(width) => self.edit_pen(entity, |pen| pen.width = width),
            MotionCommand::PenColor(color) => self.edit_pen(entity, |pen| pen.color = color),
            MotionCommand::Stamp => self.stamp_now(entity),
        }
    }

    fn execute_move(
        &mut self,
        entity: EntityId,
        to: Point,
        duration: f64,
        update_heading: bool,
    ) -> Result<(), NoOp> {
        if duration <= 0.0 {
            return self.place(entity, to, update_heading);
        }

        let steps = self.clock.steps_for(duration);
        let info = self.registry.info_mut(entity).ok_or(NoOp::UnownedHandle)?;
        let from = info.position;
        if to == from {
            return Err(NoOp::DegenerateMotion);
        }
        if update_heading {
            info.heading = (to - from).atan2();
        }
        info.motion = MotionState::Gliding(Glide::start(from, to, steps));
        trace!("{:?} gliding {:?} → {:?} in {} steps", entity, from, to, steps);
        Ok(())
    }

    //--- place() ----------------------------------------------------------
    //
    // The one relocation primitive. Checks the scene border, fires the
    // border and location hooks, draws the track segment and invalidates
    // cached bounds. Moving onto the current position changes nothing.
    //
    pub(crate) fn place(
        &mut self,
        entity: EntityId,
        to: Point,
        update_heading: bool,
    ) -> Result<(), NoOp> {
        let occupant = self
            .registry
            .occupant_mut(entity)
            .ok_or(NoOp::UnownedHandle)?;
        let old = occupant.info.position;
        if to == old {
            return Err(NoOp::DegenerateMotion);
        }
        if update_heading {
            occupant.info.heading = (to - old).atan2();
        }

        let mut new = to;
        let overflow = self
            .scene_bounds
            .map(|bounds| overflow(occupant.behavior.bounding_box() + to.to_vec2(), bounds))
            .filter(|overflow| *overflow != Vec2::ZERO);
        if let Some(overflow) = overflow {
            let (stop_h, stop_v) = occupant.behavior.stops_at_border();
            if stop_h {
                new.x -= overflow.x;
            }
            if stop_v {
                new.y -= overflow.y;
            }
        }
        occupant.info.position = new;

        if let Some(overflow) = overflow {
            self.notify(entity, |e, cx| e.on_border(cx, overflow.x, overflow.y));
        }
        if new != old {
            self.notify(entity, |e, cx| e.on_location_changed(cx, new, old));
            self.draw_segment(entity, old, new);
        }
        self.invalidate();
        Ok(())
    }

    //--- advance_motion() -------------------------------------------------
    //
    // Per-tick step of the glide in flight, or one queued command while
    // draining.
    //
    pub(crate) fn advance_motion(&mut self, entity: EntityId) {
        let Some(info) = self.registry.info_mut(entity) else {
            return;
        };
        let mut glide = match info.motion {
            MotionState::Idle => return,
            MotionState::Draining => {
                self.drain_one(entity);
                return;
            }
            MotionState::Gliding(glide) => glide,
        };

        let step = glide.step(info.position);
        info.motion = if !step.finished {
            MotionState::Gliding(glide)
        } else if info.pending.is_empty() {
            MotionState::Idle
        } else {
            MotionState::Draining
        };
        trace!("{:?} glide step {:.3}", entity, step.progress);

        // A zero-length last step is already at the target.
        let _ = self.place(entity, step.position, false);
        self.notify(entity, |e, cx| e.on_motion_step(cx, step.progress));

        if step.finished {
            self.notify(entity, |e, cx| e.on_motion_complete(cx));
            self.drain_one(entity);
        }
    }

    // Replays the oldest queued command, then settles the motion state.
    fn drain_one(&mut self, entity: EntityId) {
        let Some(info) = self.registry.info_mut(entity) else {
            return;
        };
        let Some(command) = info.pending.pop() else {
            if matches!(info.motion, MotionState::Draining) {
                info.motion = MotionState::Idle;
            }
            return;
        };
        info.motion = MotionState::Idle;
        trace!("{:?} replaying {:?}", entity, command);

        let result = self.apply_command(entity, command);
        settle("queued command", result);

        if let Some(info) = self.registry.info_mut(entity) {
            if matches!(info.motion, MotionState::Idle) && !info.pending.is_empty() {
                info.motion = MotionState::Draining;
            }
        }
    }

    fn clear_pending_inner(&mut self, entity: EntityId, finish: bool) -> Result<(), NoOp> {
        let info = self.registry.info_mut(entity).ok_or(NoOp::UnownedHandle)?;
        info.pending.clear();
        let glide = match info.motion {
            MotionState::Gliding(glide) => Some(glide),
            _ => None,
        };
        info.motion = MotionState::Idle;

        if let (Some(mut glide), true) = (glide, finish) {
            let target = glide.finish();
            let _ = self.place(entity, target, false);
            self.notify(entity, |e, cx| e.on_motion_step(cx, 1.0));
            self.notify(entity, |e, cx| e.on_motion_complete(cx));
        }
        Ok(())
    }
}

//=== Helpers =============================================================

fn is_degenerate(command: &MotionCommand) -> bool {
    match command {
        MotionCommand::Move {
            target: MoveTarget::Relative(delta),
            ..
        } => *delta == Vec2::ZERO,
        MotionCommand::Advance { length, .. } => *length == 0.0,
        _ => false,
    }
}

/// How far `scene_box` sticks out of `bounds` on each axis.
///
/// Negative past the left/top edge, positive past the right/bottom.
fn overflow(scene_box: Rect, bounds: Rect) -> Vec2 {
    Vec2::new(
        axis_overflow(scene_box.x0, scene_box.x1, bounds.x0, bounds.x1),
        axis_overflow(scene_box.y0, scene_box.y1, bounds.y0, bounds.y1),
    )
}

fn axis_overflow(lo: f64, hi: f64, min: f64, max: f64) -> f64 {
    if lo < min {
        lo - min
    } else if hi > max {
        hi - max
    } else {
        0.0
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
