//! Back/forward navigation state.
//!
//! Browser semantics: navigating after going back drops the forward
//! branch before appending the new location.

use std::path::{Path, PathBuf};

use crate::path_util;

/// Linear navigation history with a cursor.
///
/// `entries` is never empty and `cursor < entries.len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStack {
    entries: Vec<PathBuf>,
    cursor: usize,
    limit: Option<usize>,
}

impl HistoryStack {
    /// Start a history at `start`.
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            entries: vec![start.into()],
            cursor: 0,
            limit: None,
        }
    }

    /// Start a history that keeps at most `limit` entries (minimum 1).
    pub fn with_limit(start: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new(start)
        }
    }

    /// Truncate the forward branch, then append `path` as the new current
    /// location.
    pub fn navigate(&mut self, path: impl Into<PathBuf>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(path.into());
        self.cursor = self.entries.len() - 1;

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
                self.cursor -= excess;
            }
        }
    }

    /// Step back. Returns the new current location, or `None` at the start.
    pub fn back(&mut self) -> Option<&Path> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step forward. Returns the new current location, or `None` at the end.
    pub fn forward(&mut self) -> Option<&Path> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    /// Parent of `current`, or `None` at a root.
    ///
    /// Pure computation; the caller follows up with [`navigate`](Self::navigate).
    pub fn up(&self, current: &Path) -> Option<PathBuf> {
        path_util::parent(current)
    }

    pub fn current(&self) -> &Path {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least its starting point.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_with_one_entry() {
        let h = HistoryStack::new("/home");
        assert_eq!(h.entries(), &[PathBuf::from("/home")]);
        assert_eq!(h.cursor(), 0);
        assert!(!h.can_go_back());
        assert!(!h.can_go_forward());
    }

    #[test]
    fn back_and_forward_walk_the_stack() {
        let mut h = HistoryStack::new("/a");
        h.navigate("/b");
        h.navigate("/c");

        assert_eq!(h.back(), Some(Path::new("/b")));
        assert_eq!(h.back(), Some(Path::new("/a")));
        assert_eq!(h.back(), None);
        assert_eq!(h.cursor(), 0);

        assert_eq!(h.forward(), Some(Path::new("/b")));
        assert_eq!(h.forward(), Some(Path::new("/c")));
        assert_eq!(h.forward(), None);
        assert_eq!(h.current(), Path::new("/c"));
    }

    #[test]
    fn navigate_after_back_drops_forward_branch() {
        let mut h = HistoryStack::new("/a");
        h.navigate("/b");
        h.navigate("/c");
        h.back();
        h.back();

        h.navigate("/x");
        assert_eq!(h.entries(), &[PathBuf::from("/a"), PathBuf::from("/x")]);
        assert_eq!(h.cursor(), 1);
        assert!(!h.can_go_forward());
    }

    #[test]
    fn up_is_pure() {
        let h = HistoryStack::new("/a/b");
        assert_eq!(h.up(Path::new("/a/b")), Some(PathBuf::from("/a")));
        assert_eq!(h.up(Path::new("/")), None);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn limit_drops_oldest_and_shifts_cursor() {
        let mut h = HistoryStack::with_limit("/0", 3);
        for i in 1..=5 {
            h.navigate(format!("/{i}"));
        }
        assert_eq!(
            h.entries(),
            &[PathBuf::from("/3"), PathBuf::from("/4"), PathBuf::from("/5")]
        );
        assert_eq!(h.cursor(), 2);
        assert_eq!(h.current(), Path::new("/5"));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Navigate(u8),
        Back,
        Forward,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            any::<u8>().prop_map(Step::Navigate),
            Just(Step::Back),
            Just(Step::Forward),
        ]
    }

    proptest! {
        #[test]
        fn cursor_stays_in_bounds(
            steps in proptest::collection::vec(step(), 0..64),
            limit in proptest::option::of(1usize..8),
        ) {
            let mut h = match limit {
                Some(limit) => HistoryStack::with_limit("/start", limit),
                None => HistoryStack::new("/start"),
            };
            // Model of the location the user should be looking at
            let mut expected = PathBuf::from("/start");

            for step in steps {
                match step {
                    Step::Navigate(n) => {
                        let target = PathBuf::from(format!("/d{n}"));
                        let before = h.cursor();
                        let kept: Vec<PathBuf> = h.entries()[..=before].to_vec();
                        h.navigate(target.clone());
                        // Everything after the old cursor is gone
                        prop_assert_eq!(h.entries().last(), Some(&target));
                        prop_assert!(!h.can_go_forward());
                        let prefix = &h.entries()[..h.len() - 1];
                        prop_assert!(kept.ends_with(prefix));
                        expected = target;
                    }
                    Step::Back => {
                        if let Some(p) = h.back() {
                            expected = p.to_path_buf();
                        }
                    }
                    Step::Forward => {
                        if let Some(p) = h.forward() {
                            expected = p.to_path_buf();
                        }
                    }
                }
                prop_assert!(!h.is_empty());
                prop_assert!(h.cursor() < h.len());
                prop_assert_eq!(h.current(), expected.as_path());
                if let Some(limit) = limit {
                    prop_assert!(h.len() <= limit);
                }
            }
        }
    }
}
