//! Positional indexes: key -> document -> positions
//!
//! The coordinate index is keyed by single terms, the word-pair index by
//! `"first second"` pairs. Both share [`PositionalPostings`] and expose
//! the lookups phrase verification needs.

use std::collections::{HashMap, HashSet};

use super::bus::IndexSubscriber;
use super::types::{fast_map, DocId, FastMap, IndexEvent, Position};

/// Documents that contain a key
pub trait DocumentLookup {
    fn documents_containing(&self, key: &str) -> HashSet<DocId>;
}

/// Positions at which a key occurs in one document
pub trait PositionLookup {
    fn positions_in(&self, key: &str, doc_id: DocId) -> Vec<Position>;
}

/// Concurrent positional posting store
pub struct PositionalPostings {
    postings: FastMap<String, HashMap<DocId, Vec<Position>>>,
}

impl Default for PositionalPostings {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionalPostings {
    pub fn new() -> Self {
        Self {
            postings: fast_map(),
        }
    }

    /// Append one occurrence. Duplicate positions are kept as emitted.
    pub fn add(&self, key: &str, doc_id: DocId, position: Position) {
        if let Some(mut docs) = self.postings.get_mut(key) {
            docs.entry(doc_id).or_default().push(position);
            return;
        }

        self.postings
            .entry(key.to_owned())
            .or_default()
            .entry(doc_id)
            .or_default()
            .push(position);
    }

    /// Copy of every (document, positions) entry for `key`
    pub fn positions_of(&self, key: &str) -> HashMap<DocId, Vec<Position>> {
        self.postings
            .get(key)
            .map(|docs| docs.value().clone())
            .unwrap_or_default()
    }

    pub fn documents_of(&self, key: &str) -> HashSet<DocId> {
        self.postings
            .get(key)
            .map(|docs| docs.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn positions_in(&self, key: &str, doc_id: DocId) -> Vec<Position> {
        self.postings
            .get(key)
            .and_then(|docs| docs.get(&doc_id).cloned())
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.postings.contains_key(key)
    }

    pub fn key_count(&self) -> usize {
        self.postings.len()
    }
}

macro_rules! positional_index {
    ($(#[$doc:meta])* $name:ident, $label:literal, $variant:ident, $key:ident) => {
        $(#[$doc])*
        #[derive(Default)]
        pub struct $name {
            postings: PositionalPostings,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn positions_of(&self, key: &str) -> HashMap<DocId, Vec<Position>> {
                self.postings.positions_of(key)
            }

            pub fn documents_of(&self, key: &str) -> HashSet<DocId> {
                self.postings.documents_of(key)
            }

            pub fn contains_key(&self, key: &str) -> bool {
                self.postings.contains_key(key)
            }

            pub fn key_count(&self) -> usize {
                self.postings.key_count()
            }
        }

        impl IndexSubscriber for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn handle(&self, event: &IndexEvent) {
                if let IndexEvent::$variant(e) = event {
                    self.postings.add(&e.$key, e.doc_id, e.position);
                }
            }
        }

        impl DocumentLookup for $name {
            fn documents_containing(&self, key: &str) -> HashSet<DocId> {
                self.postings.documents_of(key)
            }
        }

        impl PositionLookup for $name {
            fn positions_in(&self, key: &str, doc_id: DocId) -> Vec<Position> {
                self.postings.positions_in(key, doc_id)
            }
        }
    };
}

positional_index!(
    /// Term -> document -> positions
    CoordinateIndex,
    "coordinate",
    Term,
    term
);

positional_index!(
    /// Adjacent pair -> document -> position of the pair's first term
    WordPairIndex,
    "word-pair",
    Pair,
    pair
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{PairEvent, TermEvent};

    fn term(term: &str, doc_id: DocId, position: Position) -> IndexEvent {
        IndexEvent::Term(TermEvent {
            term: term.to_string(),
            doc_id,
            position,
        })
    }

    #[test]
    fn test_coordinate_positions() {
        let index = CoordinateIndex::new();
        index.handle(&term("hello", 0, 1));
        index.handle(&term("hello", 0, 3));
        index.handle(&term("hello", 2, 0));

        let mut in_doc0 = index.positions_in("hello", 0);
        in_doc0.sort_unstable();
        assert_eq!(in_doc0, vec![1, 3]);

        let positions = index.positions_of("hello");
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[&2], vec![0]);
        assert_eq!(index.documents_of("hello"), HashSet::from([0, 2]));
    }

    #[test]
    fn test_unseen_key_is_empty() {
        let index = CoordinateIndex::new();
        assert!(index.positions_of("nope").is_empty());
        assert!(index.documents_of("nope").is_empty());
        assert!(index.positions_in("nope", 0).is_empty());
        assert!(!index.contains_key("nope"));
    }

    #[test]
    fn test_duplicate_positions_kept() {
        let postings = PositionalPostings::new();
        postings.add("x", 0, 5);
        postings.add("x", 0, 5);
        assert_eq!(postings.positions_in("x", 0), vec![5, 5]);
    }

    #[test]
    fn test_indexes_ignore_foreign_events() {
        let coordinate = CoordinateIndex::new();
        let pairs = WordPairIndex::new();
        let pair = IndexEvent::Pair(PairEvent::new("hello", "world", 0, 0));

        coordinate.handle(&pair);
        pairs.handle(&pair);
        pairs.handle(&term("hello", 0, 0));

        assert_eq!(coordinate.key_count(), 0);
        assert_eq!(pairs.key_count(), 1);
        assert!(pairs.contains_key("hello world"));
        assert_eq!(pairs.documents_containing("hello world"), HashSet::from([0]));
    }
}
