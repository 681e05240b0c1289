use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use super::bus::IndexSubscriber;
use super::types::{fast_set, FastSet, IndexEvent};

/// End-of-term marker. Sorts after every char a term can contain.
pub const MARKER: char = char::MAX;

/// Rotation of `term + MARKER` -> terms producing it
pub struct PermutermIndex {
    rotations: RwLock<BTreeMap<String, HashSet<String>>>,
    indexed: FastSet<String>,
}

impl Default for PermutermIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Every rotation of `term + MARKER`
pub fn rotations(term: &str) -> Vec<String> {
    let chars: Vec<char> = term.chars().chain(std::iter::once(MARKER)).collect();
    (0..chars.len())
        .map(|i| chars[i..].iter().chain(&chars[..i]).collect())
        .collect()
}

impl PermutermIndex {
    pub fn new() -> Self {
        Self {
            rotations: RwLock::new(BTreeMap::new()),
            indexed: fast_set(),
        }
    }

    pub fn add_term(&self, term: &str) {
        let term = term.to_lowercase();
        if self.indexed.contains(&term) || !self.indexed.insert(term.clone()) {
            return;
        }

        let keys = rotations(&term);
        let mut map = self.rotations.write();
        for key in keys {
            map.entry(key).or_default().insert(term.clone());
        }
    }

    /// Terms matching `prefix*suffix`. Any other number of `*` yields nothing.
    pub fn search_by_pattern(&self, pattern: &str) -> HashSet<String> {
        let Some((prefix, suffix)) = pattern.split_once('*') else {
            return HashSet::new();
        };
        if suffix.contains('*') {
            return HashSet::new();
        }

        let mut key = String::with_capacity(pattern.len() + MARKER.len_utf8());
        key.push_str(suffix);
        key.push(MARKER);
        key.push_str(prefix);

        let map = self.rotations.read();
        map.range::<str, _>((Bound::Included(key.as_str()), Bound::Unbounded))
            .take_while(|(rotation, _)| rotation.starts_with(&key))
            .flat_map(|(_, terms)| terms.iter().cloned())
            .collect()
    }

    /// Terms with a rotation containing `substring + MARKER`.
    /// Full scan over every rotation.
    pub fn terms_containing(&self, substring: &str) -> HashSet<String> {
        let mut needle = String::with_capacity(substring.len() + MARKER.len_utf8());
        needle.push_str(substring);
        needle.push(MARKER);

        let map = self.rotations.read();
        map.iter()
            .filter(|(rotation, _)| rotation.contains(&needle))
            .flat_map(|(_, terms)| terms.iter().cloned())
            .collect()
    }

    pub fn term_count(&self) -> usize {
        self.indexed.len()
    }

    pub fn rotation_count(&self) -> usize {
        self.rotations.read().len()
    }
}

impl IndexSubscriber for PermutermIndex {
    fn name(&self) -> &'static str {
        "permuterm"
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

    fn index(terms: &[&str]) -> PermutermIndex {
        let index = PermutermIndex::new();
        for t in terms {
            index.add_term(t);
        }
        index
    }

    fn set(terms: &[&str]) -> HashSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_rotations() {
        let m = MARKER.to_string();
        assert_eq!(
            rotations("ab"),
            vec![format!("ab{m}"), format!("b{m}a"), format!("{m}ab")]
        );
        assert_eq!(rotations(""), vec![m]);
    }

    #[test]
    fn test_prefix_pattern() {
        let index = index(&["java", "javascript", "python"]);
        assert_eq!(index.search_by_pattern("jav*"), set(&["java", "javascript"]));
    }

    #[test]
    fn test_suffix_pattern() {
        let index = index(&["java", "javascript", "python", "programming", "testing"]);
        assert_eq!(index.search_by_pattern("*ing"), set(&["programming", "testing"]));
    }

    #[test]
    fn test_infix_pattern() {
        let index = index(&["programming", "program", "pricing", "pig"]);
        assert_eq!(index.search_by_pattern("pr*ing"), set(&["programming", "pricing"]));
    }

    #[test]
    fn test_star_alone_matches_everything() {
        let index = index(&["a", "bc"]);
        assert_eq!(index.search_by_pattern("*"), set(&["a", "bc"]));
    }

    #[test]
    fn test_wrong_star_count_is_empty() {
        let index = index(&["java"]);
        assert!(index.search_by_pattern("java").is_empty());
        assert!(index.search_by_pattern("j*v*").is_empty());
    }

    #[test]
    fn test_terms_are_lowercased_and_deduplicated() {
        let index = index(&["Java", "java"]);
        assert_eq!(index.term_count(), 1);
        assert_eq!(index.rotation_count(), 5);
        assert_eq!(index.search_by_pattern("ja*"), set(&["java"]));
    }

    #[test]
    fn test_terms_containing() {
        let index = index(&["testing", "sing", "song"]);
        assert_eq!(index.terms_containing("ing"), set(&["testing", "sing"]));
        assert!(index.terms_containing("xyz").is_empty());
    }
}
