//! Wildcard queries over the vocabulary
//!
//! Three interchangeable strategies find candidate terms for a pattern
//! such as `pro*ing`. Candidates are then checked against the pattern
//! itself, so every strategy returns exactly the matching terms.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::QueryError;
use crate::index::{PermutermIndex, PrefixIndex, SuffixIndex, TrigramIndex};
use crate::utils::trigram::{internal_trigrams, leading_trigrams, trailing_trigrams, Trigram};

/// Which index answers a wildcard query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WildcardStrategy {
    /// Rotations of `term + marker` in an ordered map
    #[default]
    Permuterm,
    /// Intersection of padded trigram postings
    Trigram,
    /// Prefix range intersected with suffix range
    PrefixSuffix,
}

/// A lowercased pattern split at its `*`s
#[derive(Debug)]
pub struct WildcardPattern {
    pattern: String,
    segments: Vec<String>,
}

impl WildcardPattern {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        if !raw.contains('*') {
            return Err(QueryError::InvalidPattern(raw.to_string()));
        }

        let pattern = raw.to_lowercase();
        let segments = pattern.split('*').map(str::to_owned).collect();
        Ok(Self { pattern, segments })
    }

    pub fn first(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Segments strictly between the first and the last `*`
    pub fn interior(&self) -> &[String] {
        match self.segments.len() {
            0..=2 => &[],
            n => &self.segments[1..n - 1],
        }
    }

    pub fn star_count(&self) -> usize {
        self.segments.len() - 1
    }

    /// Anchored regex: escaped pattern with each `*` as `.*`
    pub fn to_regex(&self) -> Result<Regex, QueryError> {
        let body: Vec<String> = self.segments.iter().map(|s| regex::escape(s)).collect();
        Regex::new(&format!("^{}$", body.join(".*")))
            .map_err(|_| QueryError::InvalidPattern(self.pattern.clone()))
    }

    /// Trigrams every matching term must contain
    pub fn trigrams(&self) -> Vec<Trigram> {
        let mut trigrams = Vec::new();
        if !self.first().is_empty() {
            trigrams.extend(leading_trigrams(self.first()));
        }
        for segment in self.interior() {
            trigrams.extend(internal_trigrams(segment));
        }
        if !self.last().is_empty() {
            trigrams.extend(trailing_trigrams(self.last()));
        }
        trigrams.sort_unstable();
        trigrams.dedup();
        trigrams
    }
}

/// Exact check of a candidate against its pattern
enum Matcher {
    Affixes {
        prefix: String,
        suffix: String,
        min_chars: usize,
    },
    Regex(Regex),
}

impl Matcher {
    fn new(pattern: &WildcardPattern) -> Result<Self, QueryError> {
        if pattern.star_count() > 1 {
            return Ok(Matcher::Regex(pattern.to_regex()?));
        }
        Ok(Matcher::Affixes {
            prefix: pattern.first().to_owned(),
            suffix: pattern.last().to_owned(),
            min_chars: pattern.first().chars().count() + pattern.last().chars().count(),
        })
    }

    fn is_match(&self, term: &str) -> bool {
        match self {
            Matcher::Affixes {
                prefix,
                suffix,
                min_chars,
            } => {
                term.starts_with(prefix.as_str())
                    && term.ends_with(suffix.as_str())
                    && term.chars().count() >= *min_chars
            }
            Matcher::Regex(re) => re.is_match(term),
        }
    }
}

pub struct WildcardQueryEvaluator {
    permuterm: Arc<PermutermIndex>,
    trigrams: Arc<TrigramIndex>,
    prefixes: Arc<PrefixIndex>,
    suffixes: Arc<SuffixIndex>,
}

impl WildcardQueryEvaluator {
    pub fn new(
        permuterm: Arc<PermutermIndex>,
        trigrams: Arc<TrigramIndex>,
        prefixes: Arc<PrefixIndex>,
        suffixes: Arc<SuffixIndex>,
    ) -> Self {
        Self {
            permuterm,
            trigrams,
            prefixes,
            suffixes,
        }
    }

    /// Terms of the vocabulary matching `pattern`
    pub fn evaluate(
        &self,
        pattern: &str,
        strategy: WildcardStrategy,
    ) -> Result<HashSet<String>, QueryError> {
        let pattern = WildcardPattern::parse(pattern)?;
        let matcher = Matcher::new(&pattern)?;

        let candidates = match strategy {
            WildcardStrategy::Permuterm => self.by_permuterm(&pattern),
            WildcardStrategy::Trigram => self.by_trigram(&pattern),
            WildcardStrategy::PrefixSuffix => self.by_prefix_suffix(&pattern),
        };

        log::debug!(
            "{:?} {:?}: {} candidates",
            strategy,
            pattern.pattern,
            candidates.len()
        );

        Ok(candidates
            .into_iter()
            .filter(|term| matcher.is_match(term))
            .collect())
    }

    fn by_permuterm(&self, pattern: &WildcardPattern) -> HashSet<String> {
        let collapsed = format!("{}*{}", pattern.first(), pattern.last());
        self.permuterm.search_by_pattern(&collapsed)
    }

    fn by_trigram(&self, pattern: &WildcardPattern) -> HashSet<String> {
        let mut trigrams = pattern.trigrams().into_iter();
        let Some(first) = trigrams.next() else {
            return HashSet::new();
        };

        let mut candidates = self.trigrams.terms_with(first);
        for trigram in trigrams {
            if candidates.is_empty() {
                break;
            }
            let terms = self.trigrams.terms_with(trigram);
            candidates.retain(|t| terms.contains(t));
        }
        candidates
    }

    fn by_prefix_suffix(&self, pattern: &WildcardPattern) -> HashSet<String> {
        let (prefix, suffix) = (pattern.first(), pattern.last());

        match (prefix.is_empty(), suffix.is_empty()) {
            (true, true) => HashSet::new(),
            (false, true) => self.prefixes.terms_starting_with(prefix).into_iter().collect(),
            (true, false) => self.suffixes.ends_with(suffix).into_iter().collect(),
            (false, false) => {
                let ending: HashSet<String> = self.suffixes.ends_with(suffix).into_iter().collect();
                self.prefixes
                    .terms_starting_with(prefix)
                    .into_iter()
                    .filter(|t| ending.contains(t))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WildcardStrategy; 3] = [
        WildcardStrategy::Permuterm,
        WildcardStrategy::Trigram,
        WildcardStrategy::PrefixSuffix,
    ];

    fn evaluator(terms: &[&str]) -> WildcardQueryEvaluator {
        let permuterm = Arc::new(PermutermIndex::new());
        let trigrams = Arc::new(TrigramIndex::new());
        let prefixes = Arc::new(PrefixIndex::new());
        let suffixes = Arc::new(SuffixIndex::new());

        for t in terms {
            permuterm.add_term(t);
            trigrams.add_term(t);
            prefixes.add_term(t);
            suffixes.add_term(t);
        }

        WildcardQueryEvaluator::new(permuterm, trigrams, prefixes, suffixes)
    }

    fn set(terms: &[&str]) -> HashSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    fn vocabulary() -> WildcardQueryEvaluator {
        evaluator(&[
            "java",
            "javascript",
            "python",
            "programming",
            "program",
            "language",
            "testing",
            "ab",
            "abcxbcd",
        ])
    }

    #[test]
    fn test_strategies_agree() {
        let e = vocabulary();
        let cases: [(&str, &[&str]); 6] = [
            ("jav*", &["java", "javascript"]),
            ("*ing", &["programming", "testing"]),
            ("pro*ing", &["programming"]),
            ("*script", &["javascript"]),
            ("ab*ab", &[]),
            ("abcd*", &[]),
        ];

        for (pattern, expected) in cases {
            for strategy in ALL {
                assert_eq!(
                    e.evaluate(pattern, strategy).unwrap(),
                    set(expected),
                    "{:?} with {:?}",
                    pattern,
                    strategy
                );
            }
        }
    }

    #[test]
    fn test_multi_star_filtered_by_regex() {
        let e = vocabulary();
        assert_eq!(
            e.evaluate("p*o*ing", WildcardStrategy::Permuterm).unwrap(),
            set(&["programming"])
        );
        assert_eq!(
            e.evaluate("j*a*a", WildcardStrategy::Trigram).unwrap(),
            set(&["java"])
        );
        assert_eq!(
            e.evaluate("*a*", WildcardStrategy::Permuterm).unwrap(),
            set(&[
                "java",
                "javascript",
                "programming",
                "program",
                "language",
                "ab",
                "abcxbcd",
            ])
        );
    }

    #[test]
    fn test_pattern_is_lowercased() {
        let e = vocabulary();
        for strategy in ALL {
            assert_eq!(e.evaluate("JAV*", strategy).unwrap(), set(&["java", "javascript"]));
        }
    }

    #[test]
    fn test_missing_star_is_error() {
        let e = vocabulary();
        for strategy in ALL {
            assert_eq!(
                e.evaluate("java", strategy),
                Err(QueryError::InvalidPattern("java".to_string()))
            );
        }
    }

    #[test]
    fn test_bare_star() {
        let e = evaluator(&["a", "bc"]);
        assert_eq!(
            e.evaluate("*", WildcardStrategy::Permuterm).unwrap(),
            set(&["a", "bc"])
        );
        assert!(e.evaluate("*", WildcardStrategy::Trigram).unwrap().is_empty());
        assert!(e.evaluate("*", WildcardStrategy::PrefixSuffix).unwrap().is_empty());
    }

    #[test]
    fn test_regex_escapes_metacharacters() {
        let pattern = WildcardPattern::parse("a.b*c+").unwrap();
        let re = pattern.to_regex().unwrap();
        assert!(re.is_match("a.bxxc+"));
        assert!(!re.is_match("axbxxc+"));
    }

    #[test]
    fn test_pattern_segments() {
        let p = WildcardPattern::parse("ab*cd*ef*gh").unwrap();
        assert_eq!(p.first(), "ab");
        assert_eq!(p.last(), "gh");
        assert_eq!(p.interior(), &["cd".to_string(), "ef".to_string()]);
        assert_eq!(p.star_count(), 3);

        let p = WildcardPattern::parse("*x").unwrap();
        assert_eq!(p.first(), "");
        assert!(p.interior().is_empty());
    }
}
