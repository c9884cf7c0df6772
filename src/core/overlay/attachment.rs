//=========================================================================
// Overlay Attachment
//=========================================================================
//
// Owner-side references to shared overlays.
//
// Attaching retains, replacing or removing the owner releases, and
// detaching only hides. The store's count therefore always equals the
// number of owners pointing at the overlay.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::Release;
use crate::core::entity::{Entity, EntityId, OverlayId};
use crate::core::outcome::{settle, NoOp};
use crate::core::stage::{Stage, StageEvent};

//=== Types ===============================================================

/// Which bubble style an owner shows its overlay in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayKind {
    #[default]
    Speech,
    Thought,
}

/// When an attached overlay stops showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Detached or expired; still referenced, not drawn.
    Hidden,
    /// Shows until this scene uptime (ms).
    Until(u64),
    Indefinite,
}

/// What to attach.
pub enum OverlaySource {
    /// A new overlay, created on this first attach.
    New(Box<dyn Entity>),
    /// An overlay already attached to some other owner.
    Shared(OverlayId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayAttachment {
    pub overlay: OverlayId,
    pub kind: OverlayKind,
    pub expiry: Expiry,
}

impl OverlayAttachment {
    pub fn is_showing(&self) -> bool {
        !matches!(self.expiry, Expiry::Hidden)
    }
}

//=== Stage API ===========================================================

impl Stage {
    /// Attaches an overlay to `owner` for `expiry_seconds` (`<= 0` or
    /// non-finite shows it until detached).
    ///
    /// A different overlay the owner held is released first. Re-attaching
    /// the overlay the owner already holds only refreshes kind and expiry.
    pub fn attach_overlay(
        &mut self,
        owner: EntityId,
        source: OverlaySource,
        kind: OverlayKind,
        expiry_seconds: f64,
    ) -> Option<OverlayId> {
        let result = self.attach_inner(owner, source, kind, expiry_seconds);
        match result {
            Ok(overlay) => {
                self.request_repaint();
                self.conclude("attach_overlay", Ok(()));
                Some(overlay)
            }
            Err((NoOp::OverlayAlreadyAttached, overlay)) => {
                self.request_repaint();
                self.conclude("attach_overlay", Err(NoOp::OverlayAlreadyAttached));
                overlay
            }
            Err((reason, _)) => {
                self.conclude("attach_overlay", Err(reason));
                None
            }
        }
    }

    /// Stops showing `owner`'s overlay. The reference is kept until the
    /// owner attaches something else or leaves the stage.
    pub fn detach_overlay(&mut self, owner: EntityId) -> bool {
        let result = match self.registry.info_mut(owner) {
            Some(info) => match info.overlay.as_mut() {
                Some(attachment) => {
                    attachment.expiry = Expiry::Hidden;
                    Ok(())
                }
                None => Err(NoOp::NoOverlay),
            },
            None => Err(NoOp::UnownedHandle),
        };
        if result.is_ok() {
            self.request_repaint();
        }
        self.conclude("detach_overlay", result)
    }

    //--- Queries ----------------------------------------------------------

    /// The overlay `owner` references, shown or not.
    pub fn overlay_of(&self, owner: EntityId) -> Option<OverlayAttachment> {
        self.registry.info(owner)?.overlay
    }

    pub fn overlay_refcount(&self, overlay: OverlayId) -> Option<u32> {
        self.overlays.refcount(overlay)
    }

    pub fn overlay_entity(&self, overlay: OverlayId) -> Option<&dyn Entity> {
        self.overlays.behavior(overlay)
    }

    /// Live overlays on this stage.
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    //--- Internal Helpers -------------------------------------------------

    fn attach_inner(
        &mut self,
        owner: EntityId,
        source: OverlaySource,
        kind: OverlayKind,
        expiry_seconds: f64,
    ) -> Result<OverlayId, (NoOp, Option<OverlayId>)> {
        if !self.registry.contains(owner) {
            return Err((NoOp::UnownedHandle, None));
        }
        // NaN and infinity never expire.
        let expiry = if expiry_seconds > 0.0 && expiry_seconds.is_finite() {
            Expiry::Until(self.clock.deadline_after(expiry_seconds))
        } else {
            Expiry::Indefinite
        };

        let overlay = match source {
            OverlaySource::New(behavior) => {
                let overlay = self.overlays.create(behavior);
                debug!("Created {:?}", overlay);
                overlay
            }
            OverlaySource::Shared(overlay) if self.overlays.contains(overlay) => overlay,
            OverlaySource::Shared(_) => return Err((NoOp::UnownedHandle, None)),
        };

        let previous = self.registry.info(owner).and_then(|info| info.overlay);
        if let Some(previous) = previous {
            if previous.overlay == overlay {
                if let Some(info) = self.registry.info_mut(owner) {
                    info.overlay = Some(OverlayAttachment {
                        overlay,
                        kind,
                        expiry,
                    });
                }
                return Err((NoOp::OverlayAlreadyAttached, Some(overlay)));
            }
            self.release_overlay(previous.overlay);
        }

        let refcount = self
            .overlays
            .retain(overlay)
            .map_err(|reason| (reason, None))?;
        trace!("{:?} attached to {:?} (refcount {})", overlay, owner, refcount);
        if let Some(info) = self.registry.info_mut(owner) {
            info.overlay = Some(OverlayAttachment {
                overlay,
                kind,
                expiry,
            });
        }
        Ok(overlay)
    }

    /// Drops one owner reference, announcing destruction on the last one.
    pub(crate) fn release_overlay(&mut self, overlay: OverlayId) {
        match self.overlays.release(overlay) {
            Ok(Release::Destroyed) => {
                debug!("Destroyed {:?}", overlay);
                self.emit(StageEvent::OverlayDestroyed(overlay));
            }
            Ok(Release::Retained(refcount)) => {
                trace!("Released {:?} (refcount {})", overlay, refcount);
            }
            Err(reason) => {
                settle("release_overlay", Err(reason));
            }
        }
    }

    /// Hides `owner`'s overlay once its deadline has passed.
    pub(crate) fn expire_overlay(&mut self, owner: EntityId, now_ms: u64) {
        let Some(info) = self.registry.info_mut(owner) else {
            return;
        };
        let Some(attachment) = info.overlay.as_mut() else {
            return;
        };
        if let Expiry::Until(deadline) = attachment.expiry {
            if now_ms >= deadline {
                attachment.expiry = Expiry::Hidden;
                trace!("{:?} overlay expired at {}ms", owner, now_ms);
                self.request_repaint();
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::fixtures::Probe;
    use crate::core::stage::{StageConfig, StageRequest};
    use crossbeam_channel::bounded;
    use kurbo::{Point, Rect};

    struct Bubble;

    impl Entity for Bubble {
        fn bounding_box(&self) -> Rect {
            Rect::new(0.0, 0.0, 60.0, 30.0)
        }
    }

    fn bubble() -> OverlaySource {
        OverlaySource::New(Box::new(Bubble))
    }

    /// Owners currently pointing at `overlay`.
    fn owners_of(stage: &Stage, overlay: OverlayId) -> u32 {
        stage
            .paint_order()
            .into_iter()
            .filter(|id| stage.overlay_of(*id).map(|a| a.overlay) == Some(overlay))
            .count() as u32
    }

    #[test]
    fn refcount_tracks_owner_records() {
        let (tx, rx) = bounded(64);
        let mut stage = Stage::new(StageConfig {
            events: Some(tx),
            ..StageConfig::default()
        });
        let a = stage.insert(Probe::boxed().0, Point::ZERO);
        let b = stage.insert(Probe::boxed().0, Point::ZERO);

        let shared = stage
            .attach_overlay(a, bubble(), OverlayKind::Speech, 0.0)
            .unwrap();
        assert_eq!(stage.overlay_refcount(shared), Some(1));

        stage.attach_overlay(b, OverlaySource::Shared(shared), OverlayKind::Thought, 0.0);
        assert_eq!(stage.overlay_refcount(shared), Some(2));
        assert_eq!(owners_of(&stage, shared), 2);

        // Same overlay again: metadata only.
        let again = stage.attach_overlay(a, OverlaySource::Shared(shared), OverlayKind::Thought, 0.0);
        assert_eq!(again, Some(shared));
        assert_eq!(stage.overlay_refcount(shared), Some(2));
        assert_eq!(stage.overlay_of(a).map(|x| x.kind), Some(OverlayKind::Thought));

        // Detach hides but keeps the reference.
        assert!(stage.detach_overlay(a));
        assert_eq!(stage.overlay_refcount(shared), Some(2));
        assert_eq!(stage.overlay_of(a).map(|x| x.is_showing()), Some(false));

        // Replacing releases the old one.
        let own = stage
            .attach_overlay(a, bubble(), OverlayKind::Speech, 0.0)
            .unwrap();
        assert_eq!(stage.overlay_refcount(shared), Some(1));
        assert_eq!(owners_of(&stage, shared), 1);
        assert_eq!(stage.overlay_refcount(own), Some(1));

        // Removing the last owner destroys it.
        rx.try_iter().count();
        stage.remove(b, true);
        assert_eq!(stage.overlay_refcount(shared), None);
        assert_eq!(stage.overlay_count(), 1);
        assert!(rx
            .try_iter()
            .any(|e| e == StageEvent::OverlayDestroyed(shared)));
    }

    #[test]
    fn unowned_owner_creates_nothing() {
        let mut stage = Stage::default();
        let mut other = Stage::default();
        let foreign = other.insert(Probe::boxed().0, Point::ZERO);

        assert_eq!(
            stage.attach_overlay(foreign, bubble(), OverlayKind::Speech, 1.0),
            None
        );
        assert_eq!(stage.overlay_count(), 0);
        assert!(!stage.detach_overlay(foreign));
    }

    #[test]
    fn stale_shared_handle_is_rejected() {
        let mut stage = Stage::default();
        let a = stage.insert(Probe::boxed().0, Point::ZERO);
        let b = stage.insert(Probe::boxed().0, Point::ZERO);
        let overlay = stage
            .attach_overlay(a, bubble(), OverlayKind::Speech, 0.0)
            .unwrap();
        stage.remove(a, true);

        assert_eq!(
            stage.attach_overlay(b, OverlaySource::Shared(overlay), OverlayKind::Speech, 0.0),
            None
        );
        assert_eq!(stage.overlay_of(b), None);
    }

    #[test]
    fn overlay_expires_on_deadline_tick() {
        let mut stage = Stage::new(StageConfig {
            tick_length_ms: 100,
            ..StageConfig::default()
        });
        let owner = stage.insert(Probe::boxed().0, Point::ZERO);
        let overlay = stage
            .attach_overlay(owner, bubble(), OverlayKind::Speech, 0.25)
            .unwrap();
        assert_eq!(
            stage.overlay_of(owner).map(|a| a.expiry),
            Some(Expiry::Until(250))
        );

        stage.tick();
        stage.tick();
        assert_eq!(stage.overlay_of(owner).map(|a| a.is_showing()), Some(true));

        stage.tick();
        assert_eq!(stage.overlay_of(owner).map(|a| a.is_showing()), Some(false));
        assert_eq!(stage.overlay_refcount(overlay), Some(1));
    }

    #[test]
    fn non_positive_expiry_never_expires() {
        let mut stage = Stage::new(StageConfig {
            tick_length_ms: 100,
            ..StageConfig::default()
        });
        let owner = stage.insert(Probe::boxed().0, Point::ZERO);
        stage.attach_overlay(owner, bubble(), OverlayKind::Thought, 0.0);

        for _ in 0..50 {
            stage.tick();
        }
        assert_eq!(
            stage.overlay_of(owner).map(|a| a.expiry),
            Some(Expiry::Indefinite)
        );
    }

    #[test]
    fn unbounded_expiry_after_uptime_does_not_overflow() {
        let mut stage = Stage::new(StageConfig {
            tick_length_ms: 100,
            ..StageConfig::default()
        });
        let a = stage.insert(Probe::boxed().0, Point::ZERO);
        let b = stage.insert(Probe::boxed().0, Point::ZERO);
        stage.tick();

        assert!(stage
            .attach_overlay(a, bubble(), OverlayKind::Speech, f64::INFINITY)
            .is_some());
        assert_eq!(stage.overlay_of(a).map(|x| x.expiry), Some(Expiry::Indefinite));

        assert!(stage
            .attach_overlay(b, bubble(), OverlayKind::Speech, 1e300)
            .is_some());
        assert_eq!(
            stage.overlay_of(b).map(|x| x.expiry),
            Some(Expiry::Until(u64::MAX))
        );

        stage.tick();
        assert_eq!(stage.overlay_of(a).map(|x| x.is_showing()), Some(true));
        assert_eq!(stage.overlay_of(b).map(|x| x.is_showing()), Some(true));
    }

    #[test]
    fn completion_hook_can_share_an_overlay() {
        let mut stage = Stage::new(StageConfig {
            tick_length_ms: 100,
            ..StageConfig::default()
        });
        let speaker = stage.insert(Probe::boxed().0, Point::ZERO);
        let listener = stage.insert(Probe::boxed().0, Point::ZERO);
        let shared = stage
            .attach_overlay(speaker, bubble(), OverlayKind::Speech, 0.0)
            .unwrap();

        let (mut probe, _) = Probe::new();
        probe.on_complete_request = Some(StageRequest::AttachOverlay {
            owner: listener,
            overlay: shared,
            kind: OverlayKind::Thought,
            expiry_seconds: 0.5,
        });
        let mover = stage.insert(Box::new(probe), Point::ZERO);
        stage.glide_to(mover, Point::new(10.0, 0.0), 0.1, false);

        stage.tick();

        assert_eq!(stage.overlay_refcount(shared), Some(2));
        assert_eq!(
            stage.overlay_of(listener),
            Some(OverlayAttachment {
                overlay: shared,
                kind: OverlayKind::Thought,
                expiry: Expiry::Until(600),
            })
        );
    }
}
