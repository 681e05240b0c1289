use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::reader::ReaderRegistry;
use crate::error::IngestError;
use crate::index::bus::InFlight;
use crate::index::{
    fast_set, DocId, DocumentRegistry, EventBus, FastSet, IndexEvent, PairEvent, TermEvent,
};
use crate::utils::tokenizer::{tokenize, Token};

/// Outcome of ingesting one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestedDocument {
    pub doc_id: DocId,
    pub tokens: usize,
}

/// Shared by the ingestor and its pool workers
struct Pipeline {
    readers: ReaderRegistry,
    registry: Arc<DocumentRegistry>,
    bus: Arc<EventBus>,
}

impl Pipeline {
    fn process(&self, path: &Path) -> Result<IngestedDocument, IngestError> {
        let reader = self.readers.reader_for(path)?;
        let text = reader.read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let doc_id = self.registry.register_document(path);
        let mut previous: Option<Token> = None;
        let mut tokens = 0;

        for token in tokenize(&text) {
            self.bus.publish(IndexEvent::Term(TermEvent {
                term: token.term.clone(),
                doc_id,
                position: token.position,
            }));

            if let Some(prev) = &previous {
                self.bus.publish(IndexEvent::Pair(PairEvent::new(
                    &prev.term,
                    &token.term,
                    doc_id,
                    prev.position,
                )));
            }

            previous = Some(token);
            tokens += 1;
        }

        log::info!("indexed {} ({} tokens) as {}", path.display(), tokens, doc_id);
        Ok(IngestedDocument { doc_id, tokens })
    }
}

/// Reads files, registers them and publishes their term and pair events.
///
/// Each path is accepted once; later submissions of the same path are
/// ignored because the indexes are append-only.
pub struct Ingestor {
    pipeline: Arc<Pipeline>,
    pool: ThreadPool,
    accepted: FastSet<PathBuf>,
    in_flight: Arc<InFlight>,
}

impl Ingestor {
    pub fn new(
        readers: ReaderRegistry,
        registry: Arc<DocumentRegistry>,
        bus: Arc<EventBus>,
        workers: usize,
    ) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("ingest-{}", i))
            .build()
            .context("Failed to build ingestion pool")?;

        Ok(Self {
            pipeline: Arc::new(Pipeline {
                readers,
                registry,
                bus,
            }),
            pool,
            accepted: fast_set(),
            in_flight: Arc::new(InFlight::new()),
        })
    }

    pub fn readers(&self) -> &ReaderRegistry {
        &self.pipeline.readers
    }

    /// Ingest one file on the calling thread
    pub fn process_file(&self, path: &Path) -> Result<IngestedDocument, IngestError> {
        self.pipeline.process(path)
    }

    /// Schedule a file on the ingestion pool.
    /// Returns false if the path was already accepted.
    pub fn submit(&self, path: &Path) -> bool {
        if !self.accepted.insert(path.to_path_buf()) {
            log::debug!("skipping {}: already ingested", path.display());
            return false;
        }

        let pipeline = Arc::clone(&self.pipeline);
        let in_flight = Arc::clone(&self.in_flight);
        let path = path.to_path_buf();

        in_flight.add(1);
        self.pool.spawn(move || {
            if let Err(e) = pipeline.process(&path) {
                log::warn!("{}", e);
            }
            in_flight.done();
        });
        true
    }

    /// Submit every supported file under `root`. Returns how many were
    /// newly submitted.
    pub fn ingest_directory(&self, root: &Path) -> Result<usize> {
        if !root.is_dir() {
            anyhow::bail!("Not a directory: {}", root.display());
        }

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !matches!(name.as_ref(), ".git" | "node_modules" | "target")
            })
            .build();

        let mut submitted = 0;
        for entry in walker.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if path.is_file() && self.readers().supports(path) && self.submit(path) {
                submitted += 1;
            }
        }

        log::info!("submitted {} documents from {}", submitted, root.display());
        Ok(submitted)
    }

    /// Documents submitted but not yet read and published
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Block until every submitted document has been published
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.in_flight.wait_until(Instant::now() + timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{CoordinateIndex, WordPairIndex};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        registry: Arc<DocumentRegistry>,
        coordinate: Arc<CoordinateIndex>,
        pairs: Arc<WordPairIndex>,
        bus: Arc<EventBus>,
        ingestor: Ingestor,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(DocumentRegistry::new());
        let coordinate = Arc::new(CoordinateIndex::new());
        let pairs = Arc::new(WordPairIndex::new());

        let mut bus = EventBus::new(1, 64);
        bus.subscribe(coordinate.clone());
        bus.subscribe(pairs.clone());
        let bus = Arc::new(bus);

        let ingestor = Ingestor::new(
            ReaderRegistry::default(),
            Arc::clone(&registry),
            Arc::clone(&bus),
            2,
        )
        .unwrap();

        Fixture {
            registry,
            coordinate,
            pairs,
            bus,
            ingestor,
        }
    }

    #[test]
    fn test_process_file_publishes_terms_and_pairs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "the quick brown fox").unwrap();

        let f = fixture();
        let doc = f.ingestor.process_file(&path).unwrap();
        assert_eq!(doc, IngestedDocument { doc_id: 0, tokens: 4 });
        assert!(f.bus.wait_idle(Duration::from_secs(5)));

        assert_eq!(f.coordinate.key_count(), 4);
        assert_eq!(f.pairs.key_count(), 3);
        assert_eq!(f.pairs.positions_of("quick brown")[&0], vec![1]);
    }

    #[test]
    fn test_unsupported_and_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("a.pdf");
        fs::write(&pdf, "ignored").unwrap();

        let f = fixture();
        assert!(matches!(
            f.ingestor.process_file(&pdf),
            Err(IngestError::UnsupportedFile(_))
        ));
        assert!(matches!(
            f.ingestor.process_file(&dir.path().join("missing.txt")),
            Err(IngestError::Io { .. })
        ));
        assert_eq!(f.registry.document_count(), 0);
    }

    #[test]
    fn test_submit_once_per_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();

        let f = fixture();
        assert!(f.ingestor.submit(&path));
        assert!(!f.ingestor.submit(&path));
        assert!(f.ingestor.wait_idle(Duration::from_secs(5)));
        assert!(f.bus.wait_idle(Duration::from_secs(5)));

        assert_eq!(f.registry.document_count(), 1);
        assert_eq!(f.coordinate.positions_of("hello")[&0], vec![0]);
    }

    #[test]
    fn test_ingest_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("nested").join("b.txt"), "beta").unwrap();
        fs::write(dir.path().join("c.bin"), "gamma").unwrap();

        let f = fixture();
        assert_eq!(f.ingestor.ingest_directory(dir.path()).unwrap(), 2);
        assert_eq!(f.ingestor.ingest_directory(dir.path()).unwrap(), 0);
        assert!(f.ingestor.wait_idle(Duration::from_secs(5)));
        assert!(f.bus.wait_idle(Duration::from_secs(5)));

        assert_eq!(f.registry.document_count(), 2);
        assert!(f.coordinate.contains_key("alpha"));
        assert!(f.coordinate.contains_key("beta"));
        assert!(!f.coordinate.contains_key("gamma"));
        assert_eq!(f.ingestor.in_flight(), 0);
    }

    #[test]
    fn test_ingest_directory_rejects_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "x").unwrap();
        assert!(fixture().ingestor.ingest_directory(&path).is_err());
    }
}
