//! Ordered term sets for prefix and suffix range scans

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::ops::Bound;

use super::bus::IndexSubscriber;
use super::types::{fast_set, FastSet, IndexEvent};

/// Ordered set of keys with an "already present" fast path
struct OrderedTerms {
    keys: RwLock<BTreeSet<String>>,
    seen: FastSet<String>,
}

impl OrderedTerms {
    fn new() -> Self {
        Self {
            keys: RwLock::new(BTreeSet::new()),
            seen: fast_set(),
        }
    }

    fn insert(&self, key: String) {
        if self.seen.contains(&key) || !self.seen.insert(key.clone()) {
            return;
        }
        self.keys.write().insert(key);
    }

    fn starting_with(&self, prefix: &str) -> Vec<String> {
        let keys = self.keys.read();
        keys.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

fn reversed(s: &str) -> String {
    s.chars().rev().collect()
}

/// Terms in lexicographic order
pub struct PrefixIndex {
    terms: OrderedTerms,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self {
            terms: OrderedTerms::new(),
        }
    }

    pub fn add_term(&self, term: &str) {
        self.terms.insert(term.to_owned());
    }

    /// Every term beginning with `prefix`, in order
    pub fn terms_starting_with(&self, prefix: &str) -> Vec<String> {
        self.terms.starting_with(prefix)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reversed terms in lexicographic order
pub struct SuffixIndex {
    reversed_terms: OrderedTerms,
}

impl Default for SuffixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SuffixIndex {
    pub fn new() -> Self {
        Self {
            reversed_terms: OrderedTerms::new(),
        }
    }

    pub fn add_term(&self, term: &str) {
        self.reversed_terms.insert(reversed(term));
    }

    /// Every term ending with `suffix`
    pub fn ends_with(&self, suffix: &str) -> Vec<String> {
        self.reversed_terms
            .starting_with(&reversed(suffix))
            .iter()
            .map(|r| reversed(r))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reversed_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexSubscriber for PrefixIndex {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn handle(&self, event: &IndexEvent) {
        if let IndexEvent::Term(e) = event {
            self.add_term(&e.term);
        }
    }
}

impl IndexSubscriber for SuffixIndex {
    fn name(&self) -> &'static str {
        "suffix"
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
    fn test_terms_starting_with() {
        let index = PrefixIndex::new();
        for t in ["java", "javascript", "jar", "python", "ja"] {
            index.add_term(t);
        }

        assert_eq!(index.terms_starting_with("jav"), vec!["java", "javascript"]);
        assert_eq!(index.terms_starting_with("ja").len(), 4);
        assert!(index.terms_starting_with("z").is_empty());
        assert_eq!(index.terms_starting_with("").len(), 5);
    }

    #[test]
    fn test_ends_with() {
        let index = SuffixIndex::new();
        for t in ["programming", "testing", "java", "ing"] {
            index.add_term(t);
        }

        let mut found = index.ends_with("ing");
        found.sort();
        assert_eq!(found, vec!["ing", "programming", "testing"]);
        assert!(index.ends_with("xyz").is_empty());
    }

    #[test]
    fn test_non_ascii_suffix() {
        let index = SuffixIndex::new();
        index.add_term("привет");
        assert_eq!(index.ends_with("вет"), vec!["привет"]);
    }

    #[test]
    fn test_repeated_terms_stored_once() {
        let index = PrefixIndex::new();
        index.add_term("java");
        index.add_term("java");
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }
}
