//=========================================================================
// Stage
//=========================================================================
//
// The scene: every staged entity's position, depth order, clocks, motion
// queue and overlay attachment, kept consistent under one tick.
//
// Architecture:
//   Stage
//     ├─ registry: Registry        (ring arena, depth order)
//     ├─ overlays: OverlayStore    (shared, reference-counted bubbles)
//     ├─ tracks: TrackStore        (pen marks)
//     ├─ clock: SceneClock         (fixed tick length, uptime)
//     ├─ requests: RequestQueue    (mutations issued by callbacks)
//     ├─ batch: UpdateBatch        (coalesced repaints)
//     └─ events: EventSink         (crossbeam channel to the host)
//
// Tick flow, per entity in paint order:
//   LocalClock::advance() → Entity::local_update() → Entity::step()
//   → glide step / queue drain → overlay expiry → flush requests
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;

use crossbeam_channel::Sender;
use kurbo::{Point, Rect};
use log::{info, trace};

//=== Module Declarations =================================================

mod batch;
mod events;
mod lifecycle;
mod requests;
mod selection;

//=== Public API ==========================================================

pub use events::StageEvent;
pub use lifecycle::Removal;
pub use requests::{RequestQueue, StageRequest};

//=== Internal Dependencies ===============================================

use crate::core::entity::{next_stage_tag, Entity, EntityContext, EntityId};
use crate::core::outcome::{settle, NoOp};
use crate::core::overlay::OverlayStore;
use crate::core::registry::{Direction, Registry};
use crate::core::timeline::SceneClock;
use crate::core::track::TrackStore;
use batch::UpdateBatch;
use events::EventSink;

//=== StageConfig =========================================================

/// Default tick length: 60 ticks per second, rounded to whole milliseconds.
pub const DEFAULT_TICK_LENGTH_MS: u64 = 17;

/// Construction parameters for a [`Stage`].
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Fixed period of the global tick, in milliseconds.
    pub tick_length_ms: u64,
    /// Scene area for border checks; `None` disables them.
    pub scene_bounds: Option<Rect>,
    /// Where [`StageEvent`]s are published, if anywhere.
    pub events: Option<Sender<StageEvent>>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            tick_length_ms: DEFAULT_TICK_LENGTH_MS,
            scene_bounds: None,
            events: None,
        }
    }
}

//=== Stage ===============================================================

/// Entity lifecycle, ordering and motion choreography for one scene.
///
/// Every operation taking an [`EntityId`] is a silent no-op (returning
/// `false` or `None`) when the handle is not owned by this stage.
pub struct Stage {
    pub(crate) registry: Registry,
    pub(crate) overlays: OverlayStore,
    pub(crate) tracks: TrackStore,
    pub(crate) clock: SceneClock,
    pub(crate) scene_bounds: Option<Rect>,
    pub(crate) requests: RequestQueue,
    batch: UpdateBatch,
    events: EventSink,
    bounds_cache: Cell<Option<Rect>>,
    flushing: bool,
}

impl Stage {
    //--- Construction -----------------------------------------------------

    /// Creates an empty stage.
    ///
    /// # Panics
    ///
    /// Panics if `config.tick_length_ms == 0`.
    pub fn new(config: StageConfig) -> Self {
        let tag = next_stage_tag();
        info!(
            "Creating stage {} (tick: {}ms, bounds: {:?})",
            tag, config.tick_length_ms, config.scene_bounds
        );

        Self {
            registry: Registry::new(tag),
            overlays: OverlayStore::new(tag),
            tracks: TrackStore::new(tag),
            clock: SceneClock::new(config.tick_length_ms),
            scene_bounds: config.scene_bounds,
            requests: RequestQueue::new(),
            batch: UpdateBatch::default(),
            events: EventSink::new(config.events),
            bounds_cache: Cell::new(None),
            flushing: false,
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Whether this stage owns `entity`.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.registry.contains(entity)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Entities in paint order: first is painted first (bottom-most).
    pub fn paint_order(&self) -> Vec<EntityId> {
        self.registry.walk(Direction::BackToFront)
    }

    /// The entity painted after `entity`, wrapping at the end of the ring.
    pub fn next_in_order(&self, entity: EntityId) -> Option<EntityId> {
        self.registry.next(entity)
    }

    /// The entity painted before `entity`, wrapping at the start.
    pub fn prev_in_order(&self, entity: EntityId) -> Option<EntityId> {
        self.registry.prev(entity)
    }

    pub fn position(&self, entity: EntityId) -> Option<Point> {
        self.registry.info(entity).map(|info| info.position)
    }

    pub fn is_visible(&self, entity: EntityId) -> Option<bool> {
        self.registry.info(entity).map(|info| info.visible)
    }

    /// The entity's extent in scene coordinates.
    pub fn scene_box(&self, entity: EntityId) -> Option<Rect> {
        self.registry
            .occupant(entity)
            .map(|o| o.behavior.bounding_box() + o.info.position.to_vec2())
    }

    /// Borrow the entity itself.
    pub fn entity(&self, entity: EntityId) -> Option<&dyn Entity> {
        self.registry.occupant(entity).map(|o| o.behavior.as_ref())
    }

    /// Mutably borrow the entity itself.
    pub fn entity_mut(&mut self, entity: EntityId) -> Option<&mut dyn Entity> {
        self.registry.behavior_mut(entity)
    }

    /// Union of every entity's scene box, cached until something moves.
    pub fn bounds(&self) -> Option<Rect> {
        if let Some(cached) = self.bounds_cache.get() {
            return Some(cached);
        }
        let bounds = self
            .paint_order()
            .into_iter()
            .filter_map(|id| self.scene_box(id))
            .reduce(|acc, rect| acc.union(rect));
        self.bounds_cache.set(bounds);
        bounds
    }

    /// Whether [`bounds`](Self::bounds) is answered from cache.
    pub fn bounds_cached(&self) -> bool {
        self.bounds_cache.get().is_some()
    }

    pub fn uptime_ms(&self) -> u64 {
        self.clock.uptime_ms()
    }

    pub fn tick_length_ms(&self) -> u64 {
        self.clock.tick_length_ms()
    }

    pub fn scene_bounds(&self) -> Option<Rect> {
        self.scene_bounds
    }

    //--- Update Sequences -------------------------------------------------

    /// Opens an update sequence; repaints are held until it closes.
    pub fn begin_update(&mut self) {
        self.batch.begin();
    }

    /// Closes an update sequence, flushing a held repaint at depth zero.
    pub fn end_update(&mut self) {
        if self.batch.end() {
            self.events.emit(StageEvent::Repaint);
        }
    }

    /// Runs `f` inside one update sequence.
    pub fn update_sequence<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_update();
        let result = f(self);
        self.end_update();
        result
    }

    /// Current nesting depth of update sequences.
    pub fn update_depth(&self) -> u32 {
        self.batch.depth()
    }

    //--- tick() -----------------------------------------------------------
    //
    // One global tick. Walks a snapshot of paint order so callbacks that
    // remove or reorder entities never invalidate the walk; handles that
    // went stale mid-tick are skipped.
    //
    pub fn tick(&mut self) {
        let uptime_ms = self.clock.advance();
        trace!("Stage tick at {}ms ({} entities)", uptime_ms, self.len());

        self.begin_update();
        for id in self.registry.walk(Direction::BackToFront) {
            if !self.registry.contains(id) {
                continue;
            }
            self.advance_local_clock(id);
            self.advance_motion(id);
            self.expire_overlay(id, uptime_ms);
            self.flush_requests();
        }
        self.end_update();
    }

    //--- Internal Helpers -------------------------------------------------

    /// Fires one hook on an entity with a fresh callback context.
    pub(crate) fn notify<R>(
        &mut self,
        entity: EntityId,
        hook: impl FnOnce(&mut dyn Entity, &mut EntityContext<'_>) -> R,
    ) -> Option<R> {
        let uptime_ms = self.clock.uptime_ms();
        let behavior = self.registry.behavior_mut(entity)?;
        let mut cx = EntityContext::new(entity, uptime_ms, &mut self.requests);
        Some(hook(behavior, &mut cx))
    }

    /// Drops cached bounds and asks for a repaint.
    pub(crate) fn invalidate(&mut self) {
        self.bounds_cache.set(None);
        self.request_repaint();
    }

    pub(crate) fn request_repaint(&mut self) {
        if self.batch.request_repaint() {
            self.events.emit(StageEvent::Repaint);
        }
    }

    pub(crate) fn emit(&mut self, event: StageEvent) {
        self.events.emit(event);
    }

    /// Settles an operation's result and applies requests it triggered.
    pub(crate) fn conclude(&mut self, operation: &str, result: Result<(), NoOp>) -> bool {
        let applied = settle(operation, result);
        self.flush_requests();
        applied
    }

    fn advance_local_clock(&mut self, id: EntityId) {
        let interval_ms = self.clock.tick_length_ms();
        let Some(info) = self.registry.info_mut(id) else {
            return;
        };
        let Some(local) = info.clock.advance(interval_ms) else {
            return;
        };

        let next = self.notify(id, |entity, cx| {
            entity.local_update(cx, local.frame_count, local.elapsed_ms)
        });
        if let (Some(next), Some(info)) = (next, self.registry.info_mut(id)) {
            info.clock.adopt_override(next);
        }

        self.step_entity(id);
    }

    // Lets the entity apply its own speed, then relocates if it moved.
    fn step_entity(&mut self, id: EntityId) {
        let Some(occupant) = self.registry.occupant_mut(id) else {
            return;
        };
        let from = occupant.info.position;
        let (mut x, mut y) = (from.x, from.y);
        occupant.behavior.step(&mut x, &mut y);

        let to = Point::new(x, y);
        if to != from {
            // Equal positions are the only rejection, ruled out above.
            let _ = self.place(id, to, false);
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}

//=========================================================================
// Shared Test Fixtures
//=========================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use std::cell::RefCell;
    use std::rc::Rc;

    use kurbo::{Point, Rect};

    use crate::core::entity::{Entity, EntityContext};
    use crate::core::stage::StageRequest;

    /// Callback observed by a [`Probe`].
    #[derive(Debug, Clone, PartialEq)]
    pub enum Seen {
        LocalUpdate { frame_count: u64, elapsed_ms: u64 },
        Border { h: f64, v: f64 },
        Moved { new: Point, old: Point },
        Step(f64),
        Complete,
    }

    pub type Log = Rc<RefCell<Vec<Seen>>>;

    /// A 10x10 entity that records every hook it receives.
    pub struct Probe {
        pub log: Log,
        pub size: f64,
        pub stops: (bool, bool),
        pub speed: (f64, f64),
        pub frame_durations: Vec<u64>,
        pub on_border_request: Option<StageRequest>,
        pub on_complete_request: Option<StageRequest>,
        pub remove_on_complete: bool,
    }

    impl Probe {
        pub fn new() -> (Self, Log) {
            let log: Log = Rc::new(RefCell::new(Vec::new()));
            let probe = Self {
                log: log.clone(),
                size: 10.0,
                stops: (false, false),
                speed: (0.0, 0.0),
                frame_durations: Vec::new(),
                on_border_request: None,
                on_complete_request: None,
                remove_on_complete: false,
            };
            (probe, log)
        }

        pub fn boxed() -> (Box<Self>, Log) {
            let (probe, log) = Self::new();
            (Box::new(probe), log)
        }
    }

    impl Entity for Probe {
        fn bounding_box(&self) -> Rect {
            Rect::new(0.0, 0.0, self.size, self.size)
        }

        fn stops_at_border(&self) -> (bool, bool) {
            self.stops
        }

        fn step(&mut self, x: &mut f64, y: &mut f64) {
            *x += self.speed.0;
            *y += self.speed.1;
        }

        fn local_update(
            &mut self,
            _cx: &mut EntityContext<'_>,
            frame_count: u64,
            elapsed_ms: u64,
        ) -> u64 {
            self.log.borrow_mut().push(Seen::LocalUpdate {
                frame_count,
                elapsed_ms,
            });
            self.frame_durations
                .get(frame_count as usize)
                .copied()
                .unwrap_or(0)
        }

        fn on_border(&mut self, cx: &mut EntityContext<'_>, h: f64, v: f64) {
            self.log.borrow_mut().push(Seen::Border { h, v });
            if let Some(request) = self.on_border_request {
                cx.request(request);
            }
        }

        fn on_location_changed(&mut self, _cx: &mut EntityContext<'_>, new: Point, old: Point) {
            self.log.borrow_mut().push(Seen::Moved { new, old });
        }

        fn on_motion_step(&mut self, _cx: &mut EntityContext<'_>, progress: f64) {
            self.log.borrow_mut().push(Seen::Step(progress));
        }

        fn on_motion_complete(&mut self, cx: &mut EntityContext<'_>) {
            self.log.borrow_mut().push(Seen::Complete);
            if let Some(request) = self.on_complete_request {
                cx.request(request);
            }
            if self.remove_on_complete {
                cx.remove_self();
            }
        }
    }

    pub fn moves(log: &Log) -> usize {
        log.borrow()
            .iter()
            .filter(|seen| matches!(seen, Seen::Moved { .. }))
            .count()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
