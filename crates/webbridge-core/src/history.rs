//! Back/forward availability inferred from the sequence of visited URLs.
//!
//! Some engines expose no history API, only "the URL changed". This tracker
//! rebuilds a linear history from those notifications: revisiting the
//! entry right behind or ahead of the cursor is treated as back/forward,
//! anything else truncates the forward branch and appends.

#[derive(Debug, Default, Clone)]
pub struct HistoryTracker {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&mut self, url: &str) {
        let Some(idx) = self.cursor else {
            self.entries.clear();
            self.entries.push(url.to_string());
            self.cursor = Some(0);
            return;
        };

        if self.entries.get(idx).is_some_and(|u| u == url) {
            return;
        }
        if idx > 0 && self.entries.get(idx - 1).is_some_and(|u| u == url) {
            self.cursor = Some(idx - 1);
            return;
        }
        if self.entries.get(idx + 1).is_some_and(|u| u == url) {
            self.cursor = Some(idx + 1);
            return;
        }

        self.entries.truncate(idx + 1);
        self.entries.push(url.to_string());
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some_and(|idx| idx > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor
            .is_some_and(|idx| idx + 1 < self.entries.len())
    }

    /// Entry one step back from the cursor.
    pub fn peek_back(&self) -> Option<&str> {
        let idx = self.cursor?.checked_sub(1)?;
        self.entries.get(idx).map(String::as_str)
    }

    /// Entry one step ahead of the cursor.
    pub fn peek_forward(&self) -> Option<&str> {
        let idx = self.cursor? + 1;
        self.entries.get(idx).map(String::as_str)
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|idx| self.entries.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_cannot_navigate() {
        let h = HistoryTracker::new();
        assert!(!h.can_go_back());
        assert!(!h.can_go_forward());
        assert_eq!(h.current(), None);
    }

    #[test]
    fn linear_visits() {
        let mut h = HistoryTracker::new();
        h.visit("a");
        assert!(!h.can_go_back());
        h.visit("b");
        h.visit("c");
        assert!(h.can_go_back());
        assert!(!h.can_go_forward());
        assert_eq!(h.current(), Some("c"));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn revisiting_current_is_ignored() {
        let mut h = HistoryTracker::new();
        h.visit("a");
        h.visit("a");
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn back_and_forward_move_cursor() {
        let mut h = HistoryTracker::new();
        h.visit("a");
        h.visit("b");
        h.visit("c");
        h.visit("b");
        assert_eq!(h.current(), Some("b"));
        assert!(h.can_go_forward());
        assert_eq!(h.peek_back(), Some("a"));
        assert_eq!(h.peek_forward(), Some("c"));
        h.visit("c");
        assert_eq!(h.current(), Some("c"));
        assert!(!h.can_go_forward());
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn new_visit_truncates_forward_branch() {
        let mut h = HistoryTracker::new();
        h.visit("a");
        h.visit("b");
        h.visit("c");
        h.visit("b");
        h.visit("d");
        assert_eq!(h.len(), 3);
        assert_eq!(h.current(), Some("d"));
        assert!(!h.can_go_forward());
        h.visit("b");
        assert_eq!(h.current(), Some("b"));
    }
}
