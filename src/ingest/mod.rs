//! Turning files into index events
//!
//! - [`reader`] - Extension-dispatched document readers (`.txt`, `.fb2`)
//! - [`ingestor`] - Worker pool that reads, registers and publishes documents
//! - [`vocabulary`] - Periodic snapshot of the dictionary to a word list

pub mod ingestor;
pub mod reader;
pub mod vocabulary;

pub use ingestor::{IngestedDocument, Ingestor};
pub use reader::{DocumentReader, Fb2Reader, ReaderRegistry, TxtReader};
pub use vocabulary::{SnapshotHandle, VocabularySnapshot};
