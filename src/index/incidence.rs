use parking_lot::Mutex;
use roaring::RoaringBitmap;
use std::sync::Arc;

use super::bus::IndexSubscriber;
use super::types::{fast_map, FastMap, IndexEvent};

/// Term -> bit vector over document ids
pub struct IncidenceMatrix {
    vectors: FastMap<String, Arc<Mutex<RoaringBitmap>>>,
}

impl Default for IncidenceMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl IncidenceMatrix {
    pub fn new() -> Self {
        Self {
            vectors: fast_map(),
        }
    }

    fn vector(&self, term: &str) -> Arc<Mutex<RoaringBitmap>> {
        if let Some(v) = self.vectors.get(term) {
            return v.value().clone();
        }
        self.vectors.entry(term.to_owned()).or_default().value().clone()
    }

    /// Copy of the term's vector, empty if the term was never seen
    pub fn vector_for(&self, term: &str) -> RoaringBitmap {
        self.vectors
            .get(term)
            .map(|v| v.value().lock().clone())
            .unwrap_or_default()
    }

    pub fn term_count(&self) -> usize {
        self.vectors.len()
    }
}

impl IndexSubscriber for IncidenceMatrix {
    fn name(&self) -> &'static str {
        "incidence"
    }

    fn handle(&self, event: &IndexEvent) {
        if let IndexEvent::Term(e) = event {
            // Shard lock is released before the vector lock is taken
            let vector = self.vector(&e.term);
            vector.lock().insert(e.doc_id);
        }
    }
}
