use dashmap::{DashMap, DashSet};

pub use crate::utils::tokenizer::Position;

/// Unique identifier for a document in the registry
pub type DocId = u32;

/// Concurrent hash map keyed with ahash
pub type FastMap<K, V> = DashMap<K, V, ahash::RandomState>;

/// Concurrent hash set keyed with ahash
pub type FastSet<K> = DashSet<K, ahash::RandomState>;

pub fn fast_map<K: Eq + std::hash::Hash, V>() -> FastMap<K, V> {
    DashMap::with_hasher(ahash::RandomState::new())
}

pub fn fast_set<K: Eq + std::hash::Hash>() -> FastSet<K> {
    DashSet::with_hasher(ahash::RandomState::new())
}

/// One occurrence of a term in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEvent {
    pub term: String,
    pub doc_id: DocId,
    pub position: Position,
}

/// Two consecutive terms, keyed as `"first second"`, positioned at the first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEvent {
    pub pair: String,
    pub doc_id: DocId,
    pub position: Position,
}

impl PairEvent {
    pub fn new(first: &str, second: &str, doc_id: DocId, position: Position) -> Self {
        Self {
            pair: pair_key(first, second),
            doc_id,
            position,
        }
    }
}

/// Everything the ingestor publishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    Term(TermEvent),
    Pair(PairEvent),
}

/// Key of the word-pair index
pub fn pair_key(first: &str, second: &str) -> String {
    let mut key = String::with_capacity(first.len() + second.len() + 1);
    key.push_str(first);
    key.push(' ');
    key.push_str(second);
    key
}

/// Snapshot of engine sizes
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub terms: usize,
    pub pairs: usize,
    pub trigrams: usize,
    pub pending_events: usize,
}
