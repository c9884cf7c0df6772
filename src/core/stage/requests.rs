//=========================================================================
// Stage Requests
//=========================================================================
//
// Queue for stage mutations issued from inside entity callbacks.
//
// Callbacks fire mid-operation, so they cannot touch the stage directly.
// They push requests here; the stage applies them in FIFO order once the
// outermost operation (or the current entity's tick) returns.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

use kurbo::Point;
use log::debug;

//=== Internal Dependencies ===============================================

use super::Stage;
use crate::core::entity::{EntityId, OverlayId, TrackId};
use crate::core::motion::MotionCommand;
use crate::core::overlay::{OverlayKind, OverlaySource};

//=== StageRequest ========================================================

/// A deferred stage operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageRequest {
    /// Removes and destroys the entity.
    Remove(EntityId),

    BringToFront {
        entity: EntityId,
        target: Option<EntityId>,
    },

    SendToBack {
        entity: EntityId,
        target: Option<EntityId>,
    },

    BringForward { entity: EntityId, n: usize },

    SendBackward { entity: EntityId, n: usize },

    /// Any motion, heading or pen command; queued behind an active glide.
    Motion {
        entity: EntityId,
        command: MotionCommand,
    },

    ClearPendingMotion { entity: EntityId, finish: bool },

    /// Attaches an overlay that already exists on this stage.
    AttachOverlay {
        owner: EntityId,
        overlay: OverlayId,
        kind: OverlayKind,
        expiry_seconds: f64,
    },

    DetachOverlay(EntityId),

    BindTrack {
        entity: EntityId,
        track: TrackId,
        shared: bool,
        anchor: Point,
    },

    UnbindTrack(EntityId),

    SetTransient { entity: EntityId, transient: bool },

    Select { entity: EntityId, selected: bool },

    SetVisible { entity: EntityId, visible: bool },

    SetFramePeriod { entity: EntityId, frame_period_ms: u64 },
}

//=== RequestQueue ========================================================

/// FIFO of requests waiting to be applied.
#[derive(Debug, Default)]
pub struct RequestQueue {
    queue: VecDeque<StageRequest>,
}

impl RequestQueue {
    /// Creates a new empty request queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queues a request behind those already waiting.
    pub fn push(&mut self, request: StageRequest) {
        self.queue.push_back(request);
    }

    /// Takes the oldest request.
    pub fn pop(&mut self) -> Option<StageRequest> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

//=== Application =========================================================

impl Stage {
    //--- flush_requests() -------------------------------------------------
    //
    // Applies queued requests until none remain. Requests applied here
    // may fire callbacks that queue more; those run in the same loop.
    // Nested calls return immediately so only the outermost loop drains.
    //
    pub(crate) fn flush_requests(&mut self) {
        if self.flushing {
            return;
        }
        self.flushing = true;
        while let Some(request) = self.requests.pop() {
            debug!("Applying deferred request {:?}", request);
            self.apply_request(request);
        }
        self.flushing = false;
    }

    fn apply_request(&mut self, request: StageRequest) {
        match request {
            StageRequest::Remove(entity) => {
                self.remove(entity, true);
            }
            StageRequest::BringToFront { entity, target } => {
                self.bring_to_front(entity, target);
            }
            StageRequest::SendToBack { entity, target } => {
                self.send_to_back(entity, target);
            }
            StageRequest::BringForward { entity, n } => {
                self.bring_forward(entity, n);
            }
            StageRequest::SendBackward { entity, n } => {
                self.send_backward(entity, n);
            }
            StageRequest::Motion { entity, command } => {
                self.submit(entity, command);
            }
            StageRequest::ClearPendingMotion { entity, finish } => {
                self.clear_pending_motion(entity, finish);
            }
            StageRequest::AttachOverlay {
                owner,
                overlay,
                kind,
                expiry_seconds,
            } => {
                self.attach_overlay(owner, OverlaySource::Shared(overlay), kind, expiry_seconds);
            }
            StageRequest::DetachOverlay(entity) => {
                self.detach_overlay(entity);
            }
            StageRequest::BindTrack {
                entity,
                track,
                shared,
                anchor,
            } => {
                self.bind_track(entity, track, shared, anchor);
            }
            StageRequest::UnbindTrack(entity) => {
                self.unbind_track(entity);
            }
            StageRequest::SetTransient { entity, transient } => {
                self.set_transient(entity, transient);
            }
            StageRequest::Select { entity, selected } => {
                if selected {
                    self.select(entity);
                } else {
                    self.deselect(entity);
                }
            }
            StageRequest::SetVisible { entity, visible } => {
                self.set_visible(entity, visible);
            }
            StageRequest::SetFramePeriod {
                entity,
                frame_period_ms,
            } => {
                self.set_frame_period(entity, frame_period_ms);
            }
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::fixtures::Probe;

    fn id(idx: u32) -> EntityId {
        EntityId {
            stage: 1,
            idx,
            generation: 0,
        }
    }

    #[test]
    fn queue_preserves_order() {
        let mut queue = RequestQueue::new();
        queue.push(StageRequest::Remove(id(1)));
        queue.push(StageRequest::DetachOverlay(id(2)));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(StageRequest::Remove(id(1))));
        assert_eq!(queue.pop(), Some(StageRequest::DetachOverlay(id(2))));
        assert!(queue.is_empty());
    }

    #[test]
    fn flush_applies_track_and_transient_requests() {
        let mut stage = Stage::default();
        let id = stage.insert(Probe::boxed().0, Point::ZERO);
        let track = stage.create_track();

        stage.requests.push(StageRequest::BindTrack {
            entity: id,
            track,
            shared: false,
            anchor: Point::ZERO,
        });
        stage.requests.push(StageRequest::SetTransient {
            entity: id,
            transient: true,
        });
        stage.flush_requests();

        assert!(stage.requests.is_empty());
        assert!(stage.pen(id).is_some());
        assert_eq!(stage.is_transient(id), Some(true));

        stage.requests.push(StageRequest::UnbindTrack(id));
        stage.flush_requests();
        assert_eq!(stage.pen(id), None);
    }
}
