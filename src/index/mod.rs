//! In-memory index structures
//!
//! Every index subscribes to the [`EventBus`] and updates only its own
//! store. Query evaluators read them without mutating anything.

pub mod affix;
pub mod bus;
pub mod dictionary;
pub mod incidence;
pub mod permuterm;
pub mod positional;
pub mod registry;
pub mod trigram;
pub mod types;

pub use affix::{PrefixIndex, SuffixIndex};
pub use bus::{EventBus, IndexSubscriber};
pub use dictionary::Dictionary;
pub use incidence::IncidenceMatrix;
pub use permuterm::PermutermIndex;
pub use positional::{CoordinateIndex, DocumentLookup, PositionLookup, WordPairIndex};
pub use registry::DocumentRegistry;
pub use trigram::TrigramIndex;
pub use types::*;
