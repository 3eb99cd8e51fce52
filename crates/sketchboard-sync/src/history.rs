//! Per-client linear undo/redo over scene snapshots.

use sketchboard_core::Snapshot;

/// Maximum number of snapshots kept on the undo stack, baseline included.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Linear snapshot history for a single client.
///
/// The undo stack always holds at least one entry: the baseline snapshot
/// captured when the scene was opened. Undo past the baseline is a no-op.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    capacity: usize,
}

impl History {
    /// Create a history seeded with the baseline snapshot.
    pub fn new(baseline: Snapshot) -> Self {
        Self::with_capacity(baseline, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a history with a custom undo depth.
    pub fn with_capacity(baseline: Snapshot, capacity: usize) -> Self {
        Self {
            undo: vec![baseline],
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a snapshot on the undo stack.
    ///
    /// A snapshot byte-equal to the current top is dropped, so repeated
    /// captures of an unchanged scene cost nothing. Any recorded snapshot
    /// clears the redo stack. Returns whether the snapshot was appended.
    pub fn record(&mut self, snapshot: Snapshot) -> bool {
        if self.undo.last() == Some(&snapshot) {
            log::trace!("history: snapshot unchanged, not recorded");
            return false;
        }
        self.undo.push(snapshot);
        self.redo.clear();
        if self.undo.len() > self.capacity {
            // Evict the oldest non-baseline entry; the baseline stays
            self.undo.remove(1);
        }
        true
    }

    /// Step back one entry.
    ///
    /// Moves the current top to the redo stack and returns the snapshot
    /// now on top, which the caller should restore. Returns `None` when
    /// only the baseline remains.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if self.undo.len() <= 1 {
            return None;
        }
        let popped = self.undo.pop()?;
        self.redo.push(popped);
        self.undo.last().cloned()
    }

    /// Step forward one entry.
    ///
    /// Moves the most recently undone snapshot back to the undo stack and
    /// returns it for restoring. Returns `None` when the redo stack is empty.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let snapshot = self.redo.pop()?;
        self.undo.push(snapshot.clone());
        Some(snapshot)
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of entries on the undo stack, baseline included.
    pub fn depth(&self) -> usize {
        self.undo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(s: &str) -> Snapshot {
        Snapshot::from_encoded(s.to_string())
    }

    #[test]
    fn test_baseline_blocks_undo() {
        let mut history = History::new(snap("base"));
        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.depth(), 1);
    }

    #[test]
    fn test_undo_returns_previous_state() {
        let mut history = History::new(snap("base"));
        history.record(snap("a"));
        history.record(snap("b"));

        assert_eq!(history.undo(), Some(snap("a")));
        assert_eq!(history.undo(), Some(snap("base")));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_redo_round_trip() {
        let mut history = History::new(snap("base"));
        history.record(snap("a"));

        assert_eq!(history.undo(), Some(snap("base")));
        assert!(history.can_redo());
        assert_eq!(history.redo(), Some(snap("a")));
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(snap("base")));
    }

    #[test]
    fn test_record_dedups_unchanged_snapshot() {
        let mut history = History::new(snap("base"));
        assert!(!history.record(snap("base")));
        assert!(history.record(snap("a")));
        assert!(!history.record(snap("a")));
        assert_eq!(history.depth(), 2);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(snap("base"));
        history.record(snap("a"));
        history.undo();
        assert!(history.can_redo());

        history.record(snap("b"));
        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_capacity_evicts_oldest_but_keeps_baseline() {
        let mut history = History::with_capacity(snap("base"), 3);
        history.record(snap("a"));
        history.record(snap("b"));
        history.record(snap("c"));
        assert_eq!(history.depth(), 3);

        // "a" was evicted; undoing all the way lands on the baseline
        assert_eq!(history.undo(), Some(snap("b")));
        assert_eq!(history.undo(), Some(snap("base")));
        assert_eq!(history.undo(), None);
    }
}
