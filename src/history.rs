/// Linear undo/redo over document snapshots.
///
/// Two stacks: `past` holds pre-mutation snapshots (bounded, oldest evicted)
/// and `future` holds states undone away from. Any recorded edit that is not
/// itself an undo/redo wipes `future`.
use std::collections::VecDeque;

/// Snapshots kept before the oldest edit falls off the back.
const MAX_HISTORY: usize = 50;

#[derive(Debug, Default)]
pub struct History {
    past: VecDeque<String>,
    future: VecDeque<String>,
}

impl History {
    /// Push the pre-mutation document. Call immediately before any
    /// user- or AI-driven mutation that should be undoable — never from
    /// undo/redo themselves.
    pub fn record(&mut self, old: &str) {
        self.past.push_back(old.to_string());
        if self.past.len() > MAX_HISTORY {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back: returns the snapshot to restore, or None if there is
    /// nothing to undo. `current` becomes the next redo target.
    pub fn undo(&mut self, current: &str) -> Option<String> {
        let restored = self.past.pop_back()?;
        self.future.push_front(current.to_string());
        Some(restored)
    }

    /// Step forward again after an undo. No-op on an empty redo stack.
    pub fn redo(&mut self, current: &str) -> Option<String> {
        let restored = self.future.pop_front()?;
        self.past.push_back(current.to_string());
        if self.past.len() > MAX_HISTORY {
            self.past.pop_front();
        }
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Undoable steps currently held (status bar display).
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_redo_walks_the_chain() {
        let mut h = History::default();
        let mut buf = "A".to_string();

        h.record(&buf);
        buf = "AB".to_string();
        h.record(&buf);
        buf = "ABC".to_string();

        buf = h.undo(&buf).unwrap();
        assert_eq!(buf, "AB");
        buf = h.undo(&buf).unwrap();
        assert_eq!(buf, "A");
        assert!(h.undo(&buf).is_none());
        assert_eq!(buf, "A");

        buf = h.redo(&buf).unwrap();
        assert_eq!(buf, "AB");
        buf = h.redo(&buf).unwrap();
        assert_eq!(buf, "ABC");
        assert!(h.redo(&buf).is_none());
    }

    #[test]
    fn past_is_bounded_to_fifty() {
        let mut h = History::default();
        for i in 0..60 {
            h.record(&format!("v{i}"));
        }
        assert_eq!(h.undo_depth(), 50);
        // Walk all the way back — the oldest surviving snapshot is v10
        let mut current = "v60".to_string();
        while let Some(prev) = h.undo(&current) {
            current = prev;
        }
        assert_eq!(current, "v10");
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut h = History::default();
        h.record("A");
        let restored = h.undo("AB").unwrap();
        assert_eq!(restored, "A");
        assert!(h.can_redo());
        h.record("A"); // diverging edit
        assert!(!h.can_redo());
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut h = History::default();
        assert!(h.undo("x").is_none());
        assert!(h.redo("x").is_none());
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
