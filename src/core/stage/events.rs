//=========================================================================
// Stage Events
//=========================================================================
//
// Notifications published to the renderer and host.
//
// Events go out over a bounded crossbeam channel with `try_send`: the
// stage never blocks on a slow consumer. A full channel drops the event
// with a warning; a disconnected one is logged once and then ignored.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Sender, TrySendError};
use log::warn;

//=== Internal Dependencies ===============================================

use crate::core::entity::{EntityId, OverlayId};

//=== StageEvent ==========================================================

/// Something the renderer or host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// The scene needs repainting.
    Repaint,

    SelectionChanged { entity: EntityId, selected: bool },

    /// An overlay lost its last owner and was destroyed.
    OverlayDestroyed(OverlayId),
}

//=== EventSink ===========================================================

#[derive(Debug, Default)]
pub(crate) struct EventSink {
    sender: Option<Sender<StageEvent>>,
}

impl EventSink {
    pub fn new(sender: Option<Sender<StageEvent>>) -> Self {
        Self { sender }
    }

    pub fn emit(&mut self, event: StageEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Stage event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Stage event receiver disconnected, events disabled");
                self.sender = None;
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
    use crossbeam_channel::bounded;

    #[test]
    fn emit_delivers_in_order() {
        let (tx, rx) = bounded(4);
        let mut sink = EventSink::new(Some(tx));
        sink.emit(StageEvent::Repaint);
        sink.emit(StageEvent::Repaint);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (tx, rx) = bounded(1);
        let mut sink = EventSink::new(Some(tx));
        sink.emit(StageEvent::Repaint);
        sink.emit(StageEvent::Repaint);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn disconnected_receiver_disables_sink() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut sink = EventSink::new(Some(tx));
        sink.emit(StageEvent::Repaint);
        assert!(sink.sender.is_none());
    }
}
