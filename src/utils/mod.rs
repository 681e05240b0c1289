//! Utility functions shared by ingestion and queries.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory management (XDG-compliant)
//! - [`progress`] - Indexing spinner that compiles away without the `progress` feature
//! - [`tokenizer`] - Text normalization into positioned terms
//! - [`trigram`] - Padded char trigrams for the trigram index and wildcard queries
//!
//! ## Key Functions
//!
//! ```no_run
//! use minidex::utils::{normalize, padded_trigrams};
//!
//! // Same pipeline for documents and queries
//! let terms = normalize("Java Programming");
//! // Returns: ["java", "programming"]
//!
//! // Boundary-padded trigrams of a term
//! let trigrams = padded_trigrams("java");
//! // "  j", " ja", "jav", "ava", "va ", "a  "
//! ```

pub mod app_data;
pub mod progress;
pub mod tokenizer;
pub mod trigram;

pub use app_data::*;
pub use tokenizer::*;
pub use trigram::*;
