#![no_main]

use libfuzzer_sys::fuzz_target;
use minidex::index::{PermutermIndex, PrefixIndex, SuffixIndex, TrigramIndex};
use minidex::query::{WildcardQueryEvaluator, WildcardStrategy};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let Ok(pattern) = std::str::from_utf8(data) else {
        return;
    };

    let permuterm = Arc::new(PermutermIndex::new());
    let trigrams = Arc::new(TrigramIndex::new());
    let prefixes = Arc::new(PrefixIndex::new());
    let suffixes = Arc::new(SuffixIndex::new());
    for term in ["java", "javascript", "programming", "testing", "ab", "abcxbcd", "über"] {
        permuterm.add_term(term);
        trigrams.add_term(term);
        prefixes.add_term(term);
        suffixes.add_term(term);
    }

    let evaluator = WildcardQueryEvaluator::new(permuterm, trigrams, prefixes, suffixes);
    let results: Vec<_> = [
        WildcardStrategy::Permuterm,
        WildcardStrategy::Trigram,
        WildcardStrategy::PrefixSuffix,
    ]
    .into_iter()
    .map(|s| evaluator.evaluate(pattern, s))
    .collect();

    // Every strategy returns exactly the matching terms, so any two agree
    // whenever the pattern has a non-empty affix
    if pattern.starts_with('*') && pattern.ends_with('*') {
        return;
    }
    if let (Ok(a), Ok(b)) = (&results[0], &results[2]) {
        assert_eq!(a, b);
    }
});
