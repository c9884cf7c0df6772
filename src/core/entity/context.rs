//=========================================================================
// Entity Context
//=========================================================================
//
// What an entity sees while one of its callbacks runs.
//
// Callbacks fire while the stage is mid-operation, so they cannot borrow
// the stage. Instead they queue `StageRequest`s here; the stage applies
// them in order once the operation that fired the callback returns.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::EntityId;
use crate::core::stage::{RequestQueue, StageRequest};

//=== EntityContext =======================================================

/// Callback context handed to [`Entity`](super::Entity) hooks.
pub struct EntityContext<'a> {
    entity: EntityId,
    uptime_ms: u64,
    requests: &'a mut RequestQueue,
}

impl<'a> EntityContext<'a> {
    pub(crate) fn new(entity: EntityId, uptime_ms: u64, requests: &'a mut RequestQueue) -> Self {
        Self {
            entity,
            uptime_ms,
            requests,
        }
    }

    /// The handle of the entity whose callback is running.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Scene uptime in milliseconds at the moment of the callback.
    pub fn uptime_ms(&self) -> u64 {
        self.uptime_ms
    }

    /// Queues a request to be applied after the current operation.
    pub fn request(&mut self, request: StageRequest) {
        self.requests.push(request);
    }

    /// Queues removal of the calling entity.
    pub fn remove_self(&mut self) {
        let entity = self.entity;
        self.requests.push(StageRequest::Remove(entity));
    }
}
