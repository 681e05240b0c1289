//! # minidex - in-memory full-text search
//!
//! minidex ingests `.txt` and `.fb2` documents from a folder and answers
//! three kinds of queries over them:
//!
//! - postfix **boolean** expressions (`java python AND`)
//! - exact **phrases** (`"brave new world"`)
//! - **wildcard** patterns over the vocabulary (`pro*ing`)
//!
//! ## Architecture
//!
//! - [`ingest`] - Readers, the parallel ingestor and vocabulary snapshots
//! - [`index`] - Event bus and the indexes it feeds
//! - [`query`] - Boolean, phrase and wildcard evaluators
//! - [`engine`] - Wires the stores, bus, ingestor and evaluators together
//! - [`server`] - Unix socket server, client and folder watcher
//! - [`output`] - Terminal formatting
//! - [`utils`] - Tokenizer, trigrams, app data paths
//!
//! Every document is tokenized once. Each `(term, position)` is published as
//! an event on the bus and every index applies it on its own worker
//! threads, so indexes are eventually consistent with each other.
//!
//! ## Quick Start
//!
//! ```no_run
//! use minidex::config::EngineConfig;
//! use minidex::engine::Engine;
//! use minidex::query::PhraseStrategy;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let engine = Engine::new(EngineConfig::load()).unwrap();
//! engine.ingest_directory(Path::new("books")).unwrap();
//! engine.wait_until_indexed(Duration::from_secs(30));
//!
//! for path in engine.phrase_query("brave new world", PhraseStrategy::Term) {
//!     println!("{}", path.display());
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod output;
pub mod query;
pub mod server;
pub mod utils;
