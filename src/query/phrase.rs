use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::index::{
    pair_key, CoordinateIndex, DocId, DocumentLookup, DocumentRegistry, PositionLookup,
    WordPairIndex,
};
use crate::utils::tokenizer::normalize;

/// Which positional index answers a phrase query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PhraseStrategy {
    /// Verify term positions in the coordinate index
    #[default]
    Term,
    /// Verify adjacent-pair positions in the word-pair index
    Pair,
}

/// Documents containing every key
pub fn candidate_documents<I: DocumentLookup>(index: &I, keys: &[String]) -> HashSet<DocId> {
    let Some((first, rest)) = keys.split_first() else {
        return HashSet::new();
    };

    let mut candidates = index.documents_containing(first);
    for key in rest {
        if candidates.is_empty() {
            break;
        }
        let docs = index.documents_containing(key);
        candidates.retain(|d| docs.contains(d));
    }
    candidates
}

/// True if some start position `p` of `keys[0]` has `keys[i]` at `p + i`
/// for every `i`.
pub fn has_sequential_positions<I: PositionLookup>(
    index: &I,
    keys: &[String],
    doc_id: DocId,
) -> bool {
    let Some((first, rest)) = keys.split_first() else {
        return false;
    };

    let mut starts = index.positions_in(first, doc_id);
    for (offset, key) in rest.iter().enumerate() {
        if starts.is_empty() {
            return false;
        }
        let offset = offset as u32 + 1;
        let positions: HashSet<_> = index.positions_in(key, doc_id).into_iter().collect();
        starts.retain(|p| p.checked_add(offset).is_some_and(|q| positions.contains(&q)));
    }
    !starts.is_empty()
}

fn matching_documents<I: DocumentLookup + PositionLookup>(
    index: &I,
    keys: &[String],
) -> HashSet<DocId> {
    candidate_documents(index, keys)
        .into_iter()
        .filter(|&doc| has_sequential_positions(index, keys, doc))
        .collect()
}

pub struct PhraseQueryEvaluator {
    coordinate: Arc<CoordinateIndex>,
    pairs: Arc<WordPairIndex>,
    registry: Arc<DocumentRegistry>,
}

impl PhraseQueryEvaluator {
    pub fn new(
        coordinate: Arc<CoordinateIndex>,
        pairs: Arc<WordPairIndex>,
        registry: Arc<DocumentRegistry>,
    ) -> Self {
        Self {
            coordinate,
            pairs,
            registry,
        }
    }

    /// Ids of documents containing the phrase. Phrases that normalize to
    /// fewer than two terms match nothing.
    pub fn evaluate_ids(&self, phrase: &str, strategy: PhraseStrategy) -> HashSet<DocId> {
        let terms = normalize(phrase);
        if terms.len() < 2 {
            return HashSet::new();
        }

        match strategy {
            PhraseStrategy::Term => matching_documents(self.coordinate.as_ref(), &terms),
            PhraseStrategy::Pair => {
                let pairs: Vec<String> = terms.windows(2).map(|w| pair_key(&w[0], &w[1])).collect();
                matching_documents(self.pairs.as_ref(), &pairs)
            }
        }
    }

    pub fn evaluate(&self, phrase: &str, strategy: PhraseStrategy) -> HashSet<PathBuf> {
        self.evaluate_ids(phrase, strategy)
            .into_iter()
            .filter_map(|id| self.registry.document_path(id))
            .collect()
    }
}
