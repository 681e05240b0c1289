//! Event debouncer for file system events
//!
//! Accumulates file system events within a time window and produces one
//! normalized batch. Editors and copy tools emit bursts of create/modify
//! events for a single file; the batch names each path once.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Kind of file change detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// Files that appeared or changed within one debounce window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub created: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.created.len() + self.modified.len()
    }

    /// Every path in the batch, created first
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.created.iter().chain(self.modified.iter())
    }
}

/// Debouncer that accumulates file changes within a time window
pub struct EventDebouncer {
    window: Duration,
    /// Pending changes by path
    pending: HashMap<PathBuf, ChangeKind>,
    /// Time of the last event (any file)
    last_event: Option<Instant>,
}

impl EventDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            last_event: None,
        }
    }

    /// Add a file change event to the debouncer
    pub fn add_event(&mut self, path: PathBuf, kind: ChangeKind) {
        self.last_event = Some(Instant::now());

        let merged = match (self.pending.get(&path).copied(), kind) {
            // Created then deleted inside the window: nothing happened
            (Some(ChangeKind::Created), ChangeKind::Deleted) => {
                self.pending.remove(&path);
                return;
            }
            // Content written while the file is being created
            (Some(ChangeKind::Created), ChangeKind::Modified) => ChangeKind::Created,
            // Replaced by a new file
            (Some(ChangeKind::Deleted), ChangeKind::Created) => ChangeKind::Modified,
            (_, kind) => kind,
        };
        self.pending.insert(path, merged);
    }

    /// Check if the debounce window has elapsed since the last event
    pub fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.window)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush all pending changes into a batch.
    /// Deleted paths are dropped. Returns None if nothing is left.
    pub fn flush(&mut self) -> Option<ChangeBatch> {
        self.last_event = None;

        let mut batch = ChangeBatch::default();
        for (path, kind) in self.pending.drain() {
            match kind {
                ChangeKind::Created => batch.created.push(path),
                ChangeKind::Modified => batch.modified.push(path),
                ChangeKind::Deleted => {}
            }
        }

        batch.created.sort();
        batch.modified.sort();

        if batch.is_empty() { None } else { Some(batch) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> EventDebouncer {
        EventDebouncer::new(Duration::from_millis(50))
    }

    #[test]
    fn test_create_then_modify_is_create() {
        let mut d = debouncer();
        d.add_event(PathBuf::from("a.txt"), ChangeKind::Created);
        d.add_event(PathBuf::from("a.txt"), ChangeKind::Modified);

        let batch = d.flush().unwrap();
        assert_eq!(batch.created, vec![PathBuf::from("a.txt")]);
        assert!(batch.modified.is_empty());
    }

    #[test]
    fn test_create_then_delete_is_noop() {
        let mut d = debouncer();
        d.add_event(PathBuf::from("a.txt"), ChangeKind::Created);
        d.add_event(PathBuf::from("a.txt"), ChangeKind::Deleted);

        assert!(!d.has_pending());
        assert!(d.flush().is_none());
    }

    #[test]
    fn test_delete_then_create_is_modify() {
        let mut d = debouncer();
        d.add_event(PathBuf::from("a.txt"), ChangeKind::Deleted);
        d.add_event(PathBuf::from("a.txt"), ChangeKind::Created);

        let batch = d.flush().unwrap();
        assert_eq!(batch.modified, vec![PathBuf::from("a.txt")]);
    }

    #[test]
    fn test_deletions_are_dropped() {
        let mut d = debouncer();
        d.add_event(PathBuf::from("gone.txt"), ChangeKind::Deleted);
        assert!(d.has_pending());
        assert!(d.flush().is_none());
    }

    #[test]
    fn test_multiple_files_counted_once() {
        let mut d = debouncer();
        for _ in 0..3 {
            d.add_event(PathBuf::from("a.txt"), ChangeKind::Modified);
            d.add_event(PathBuf::from("b.txt"), ChangeKind::Created);
        }

        let batch = d.flush().unwrap();
        assert_eq!(batch.total_changes(), 2);
        assert_eq!(batch.paths().count(), 2);
    }

    #[test]
    fn test_ready_after_window() {
        let mut d = debouncer();
        assert!(!d.is_ready());

        d.add_event(PathBuf::from("a.txt"), ChangeKind::Created);
        assert!(!d.is_ready());
        std::thread::sleep(Duration::from_millis(60));
        assert!(d.is_ready());
    }
}
