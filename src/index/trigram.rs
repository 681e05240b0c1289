use std::collections::HashSet;

use super::bus::IndexSubscriber;
use super::types::{fast_map, fast_set, FastMap, FastSet, IndexEvent};
use crate::utils::trigram::{padded_trigrams, parse_trigram, Trigram};

/// Padded trigram -> terms containing it
pub struct TrigramIndex {
    terms: FastMap<Trigram, FastSet<String>>,
    indexed: FastSet<String>,
}

impl Default for TrigramIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self {
            terms: fast_map(),
            indexed: fast_set(),
        }
    }

    pub fn add_term(&self, term: &str) {
        if self.indexed.contains(term) || !self.indexed.insert(term.to_owned()) {
            return;
        }

        for trigram in padded_trigrams(term) {
            self.terms
                .entry(trigram)
                .or_insert_with(fast_set)
                .insert(term.to_owned());
        }
    }

    /// Terms whose padded form contains `trigram`
    pub fn terms_with(&self, trigram: Trigram) -> HashSet<String> {
        self.terms
            .get(&trigram)
            .map(|set| set.iter().map(|t| t.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Same as [`terms_with`](Self::terms_with) for a 3-char string.
    /// Strings of any other length match nothing.
    pub fn contains(&self, trigram: &str) -> HashSet<String> {
        parse_trigram(trigram)
            .map(|t| self.terms_with(t))
            .unwrap_or_default()
    }

    pub fn contains_trigram(&self, trigram: &str) -> bool {
        parse_trigram(trigram).is_some_and(|t| self.terms.contains_key(&t))
    }

    pub fn trigram_count(&self) -> usize {
        self.terms.len()
    }
}

impl IndexSubscriber for TrigramIndex {
    fn name(&self) -> &'static str {
        "trigram"
    }

    fn handle(&self, event: &IndexEvent) {
        if let IndexEvent::Term(e) = event {
            self.add_term(&e.term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_windows_indexed() {
        let index = TrigramIndex::new();
        index.add_term("java");

        for t in ["  j", " ja", "jav", "ava", "va ", "a  "] {
            assert!(index.contains_trigram(t), "missing {:?}", t);
            assert_eq!(index.contains(t), HashSet::from(["java".to_string()]));
        }
        assert_eq!(index.trigram_count(), 6);
    }

    #[test]
    fn test_shared_trigram() {
        let index = TrigramIndex::new();
        index.add_term("java");
        index.add_term("lava");
        index.add_term("java");

        assert_eq!(
            index.contains("ava"),
            HashSet::from(["java".to_string(), "lava".to_string()])
        );
    }

    #[test]
    fn test_unseen_or_malformed() {
        let index = TrigramIndex::new();
        index.add_term("ab");
        assert!(index.contains("xyz").is_empty());
        assert!(index.contains("ab").is_empty());
        assert!(!index.contains_trigram("abcd"));
        assert!(index.contains_trigram(" ab"));
    }
}
