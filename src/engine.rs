//! Application context
//!
//! Creates every store once, subscribes the indexes to the event bus and
//! hands shared references to ingestion and the query evaluators.

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::QueryError;
use crate::index::{
    CoordinateIndex, Dictionary, DocumentRegistry, EventBus, IncidenceMatrix, IndexStats,
    PermutermIndex, PrefixIndex, SuffixIndex, TrigramIndex, WordPairIndex,
};
use crate::ingest::{Ingestor, ReaderRegistry, VocabularySnapshot};
use crate::query::{
    BooleanQueryEvaluator, PhraseQueryEvaluator, PhraseStrategy, WildcardQueryEvaluator,
    WildcardStrategy,
};

pub struct Engine {
    config: EngineConfig,
    registry: Arc<DocumentRegistry>,
    bus: Arc<EventBus>,
    coordinate: Arc<CoordinateIndex>,
    pairs: Arc<WordPairIndex>,
    trigrams: Arc<TrigramIndex>,
    dictionary: Arc<Dictionary>,
    ingestor: Arc<Ingestor>,
    boolean: BooleanQueryEvaluator,
    phrase: PhraseQueryEvaluator,
    wildcard: WildcardQueryEvaluator,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let registry = Arc::new(DocumentRegistry::new());
        let coordinate = Arc::new(CoordinateIndex::new());
        let pairs = Arc::new(WordPairIndex::new());
        let incidence = Arc::new(IncidenceMatrix::new());
        let permuterm = Arc::new(PermutermIndex::new());
        let trigrams = Arc::new(TrigramIndex::new());
        let prefixes = Arc::new(PrefixIndex::new());
        let suffixes = Arc::new(SuffixIndex::new());
        let dictionary = Arc::new(Dictionary::new());

        let mut bus = EventBus::new(config.event_workers, config.queue_capacity);
        bus.subscribe(coordinate.clone());
        bus.subscribe(pairs.clone());
        bus.subscribe(incidence.clone());
        bus.subscribe(permuterm.clone());
        bus.subscribe(trigrams.clone());
        bus.subscribe(prefixes.clone());
        bus.subscribe(suffixes.clone());
        bus.subscribe(dictionary.clone());
        let bus = Arc::new(bus);

        let ingestor = Arc::new(Ingestor::new(
            ReaderRegistry::default(),
            Arc::clone(&registry),
            Arc::clone(&bus),
            config.ingest_workers,
        )?);

        let boolean = BooleanQueryEvaluator::new(Arc::clone(&incidence), Arc::clone(&registry));
        let phrase = PhraseQueryEvaluator::new(
            Arc::clone(&coordinate),
            Arc::clone(&pairs),
            Arc::clone(&registry),
        );
        let wildcard = WildcardQueryEvaluator::new(
            Arc::clone(&permuterm),
            Arc::clone(&trigrams),
            prefixes,
            suffixes,
        );

        log::debug!(
            "engine ready: {} indexes, {} ingest workers, {} workers per index",
            bus.subscriber_count(),
            config.ingest_workers,
            config.event_workers
        );

        Ok(Self {
            config,
            registry,
            bus,
            coordinate,
            pairs,
            trigrams,
            dictionary,
            ingestor,
            boolean,
            phrase,
            wildcard,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    pub fn ingestor(&self) -> &Arc<Ingestor> {
        &self.ingestor
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn coordinate_index(&self) -> &Arc<CoordinateIndex> {
        &self.coordinate
    }

    /// Submit every supported file under `root`
    pub fn ingest_directory(&self, root: &Path) -> Result<usize> {
        self.ingestor.ingest_directory(root)
    }

    pub fn boolean_query(&self, query: &str) -> Result<HashSet<PathBuf>, QueryError> {
        self.boolean.evaluate(query)
    }

    pub fn phrase_query(&self, phrase: &str, strategy: PhraseStrategy) -> HashSet<PathBuf> {
        self.phrase.evaluate(phrase, strategy)
    }

    pub fn wildcard_query(
        &self,
        pattern: &str,
        strategy: WildcardStrategy,
    ) -> Result<HashSet<String>, QueryError> {
        self.wildcard.evaluate(pattern, strategy)
    }

    /// Snapshot job writing this engine's vocabulary to the configured path
    pub fn vocabulary_snapshot(&self) -> VocabularySnapshot {
        VocabularySnapshot::new(
            Arc::clone(&self.dictionary),
            self.config.vocabulary_path.clone(),
        )
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.registry.document_count(),
            terms: self.dictionary.len(),
            pairs: self.pairs.key_count(),
            trigrams: self.trigrams.trigram_count(),
            pending_events: self.bus.pending(),
        }
    }

    /// Block until submitted documents are read and every published event
    /// is applied, or `timeout` expires. Returns whether everything settled.
    pub fn wait_until_indexed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        if !self.ingestor.wait_idle(timeout) {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.bus.wait_idle(remaining)
    }
}
