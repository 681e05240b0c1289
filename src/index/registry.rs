//! Dense document ids for ingested paths

use dashmap::mapref::entry::Entry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use super::types::{fast_map, DocId, FastMap};

/// Assigns ids from a single counter, starting at 0, with no gaps or reuse.
pub struct DocumentRegistry {
    next_id: AtomicU32,
    ids: FastMap<PathBuf, DocId>,
    paths: FastMap<DocId, PathBuf>,
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(0),
            ids: fast_map(),
            paths: fast_map(),
        }
    }

    /// Return the id of `path`, allocating the next one on first sight.
    ///
    /// The counter is bumped while the path's shard is locked, so two
    /// concurrent registrations of the same path can never burn two ids.
    pub fn register_document(&self, path: &Path) -> DocId {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }

        match self.ids.entry(path.to_path_buf()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.paths.insert(id, path.to_path_buf());
                e.insert(id);
                log::debug!("registered document {} as {}", path.display(), id);
                id
            }
        }
    }

    /// Highest id handed out so far, `None` before the first registration
    pub fn max_document_id(&self) -> Option<DocId> {
        self.next_id.load(Ordering::SeqCst).checked_sub(1)
    }

    pub fn document_path(&self, id: DocId) -> Option<PathBuf> {
        self.paths.get(&id).map(|p| p.value().clone())
    }

    pub fn document_id(&self, path: &Path) -> Option<DocId> {
        self.ids.get(path).map(|id| *id.value())
    }

    pub fn document_count(&self) -> usize {
        self.next_id.load(Ordering::SeqCst) as usize
    }
}
