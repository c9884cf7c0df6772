//=========================================================================
// Update Batch
//=========================================================================
//
// Depth-counted "begin/end update" transaction.
//
// Repaint requests raised while at least one sequence is open are held
// back and collapse into a single repaint when the outermost sequence
// closes.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::warn;

//=== UpdateBatch =========================================================

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct UpdateBatch {
    depth: u32,
    pending_repaint: bool,
}

impl UpdateBatch {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Closes one level. Returns `true` when a held-back repaint is due.
    pub fn end(&mut self) -> bool {
        if self.depth == 0 {
            warn!("end_update called without a matching begin_update");
            return false;
        }
        self.depth -= 1;
        if self.depth == 0 && self.pending_repaint {
            self.pending_repaint = false;
            return true;
        }
        false
    }

    /// Records a repaint request. Returns `true` if it should go out now.
    pub fn request_repaint(&mut self) -> bool {
        if self.depth > 0 {
            self.pending_repaint = true;
            return false;
        }
        true
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repaint_passes_through_when_closed() {
        let mut batch = UpdateBatch::default();
        assert!(batch.request_repaint());
        assert!(!batch.end());
    }

    #[test]
    fn nested_sequences_coalesce() {
        let mut batch = UpdateBatch::default();
        batch.begin();
        batch.begin();
        assert!(!batch.request_repaint());
        assert!(!batch.request_repaint());
        assert!(!batch.end());
        assert_eq!(batch.depth(), 1);
        assert!(batch.end());
        assert_eq!(batch.depth(), 0);
    }

    #[test]
    fn quiet_sequence_emits_nothing() {
        let mut batch = UpdateBatch::default();
        batch.begin();
        assert!(!batch.end());
    }
}
