use std::sync::atomic::{AtomicU64, Ordering};

use super::bus::IndexSubscriber;
use super::types::{fast_map, FastMap, IndexEvent};

/// Term -> number of occurrences across all documents
pub struct Dictionary {
    counts: FastMap<String, AtomicU64>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            counts: fast_map(),
        }
    }

    pub fn record(&self, term: &str) {
        if let Some(count) = self.counts.get(term) {
            count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.counts
            .entry(term.to_owned())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn frequency(&self, term: &str) -> u64 {
        self.counts
            .get(term)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Every known term, sorted
    pub fn vocabulary(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.counts.iter().map(|e| e.key().clone()).collect();
        terms.sort_unstable();
        terms
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl IndexSubscriber for Dictionary {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn handle(&self, event: &IndexEvent) {
        if let IndexEvent::Term(e) = event {
            self.record(&e.term);
        }
    }
}
