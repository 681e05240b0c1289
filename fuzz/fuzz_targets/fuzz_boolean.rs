#![no_main]

use libfuzzer_sys::fuzz_target;
use minidex::index::{DocumentRegistry, IncidenceMatrix, IndexEvent, IndexSubscriber, TermEvent};
use minidex::query::BooleanQueryEvaluator;
use std::path::Path;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let Ok(query) = std::str::from_utf8(data) else {
        return;
    };

    let registry = Arc::new(DocumentRegistry::new());
    let matrix = Arc::new(IncidenceMatrix::new());
    for (doc, text) in ["alpha beta", "beta gamma"].iter().enumerate() {
        let doc_id = registry.register_document(Path::new(&format!("{}.txt", doc)));
        for (position, term) in text.split(' ').enumerate() {
            matrix.handle(&IndexEvent::Term(TermEvent {
                term: term.to_string(),
                doc_id,
                position: position as u32,
            }));
        }
    }

    // Malformed queries must be errors, never panics
    let evaluator = BooleanQueryEvaluator::new(matrix, registry);
    if let Ok(ids) = evaluator.evaluate_ids(query) {
        assert!(ids.len() <= 2);
    }
});
