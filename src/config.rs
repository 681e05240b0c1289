//! Engine configuration
//!
//! Values are resolved with priority: environment variables > `config.toml`
//! in the app data directory > built-in defaults.
//!
//! ```toml
//! [ingest]
//! workers = 4
//!
//! [events]
//! workers_per_index = 2
//! queue_capacity = 10000
//!
//! [watcher]
//! debounce_ms = 500
//!
//! [vocabulary]
//! path = "/var/lib/minidex/vocabulary.txt"
//! interval_secs = 60
//! ```

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::app_data::{default_vocabulary_path, get_config_path};

/// Default number of documents ingested in parallel
pub const DEFAULT_INGEST_WORKERS: usize = 4;

/// Default number of dispatch threads draining each index queue
pub const DEFAULT_EVENT_WORKERS: usize = 2;

/// Default capacity of each index queue before publishers block
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default interval between vocabulary snapshots
pub const DEFAULT_VOCABULARY_INTERVAL_SECS: u64 = 60;

/// Shortest snapshot period accepted from config
const MIN_VOCABULARY_INTERVAL_SECS: u64 = 1;

/// Configuration file format (TOML). Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub ingest: IngestSection,
    #[serde(default)]
    pub events: EventsSection,
    #[serde(default)]
    pub watcher: WatcherSection,
    #[serde(default)]
    pub vocabulary: VocabularySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestSection {
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsSection {
    pub workers_per_index: Option<usize>,
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatcherSection {
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularySection {
    pub path: Option<PathBuf>,
    pub interval_secs: Option<u64>,
}

/// Resolved engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Documents ingested in parallel
    pub ingest_workers: usize,
    /// Dispatch threads per subscribed index
    pub event_workers: usize,
    /// Bounded queue capacity per subscribed index
    pub queue_capacity: usize,
    /// Debounce window for the folder watcher
    pub debounce_ms: u64,
    /// Where the vocabulary snapshot is written
    pub vocabulary_path: PathBuf,
    /// Seconds between vocabulary snapshots
    pub vocabulary_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ingest_workers: DEFAULT_INGEST_WORKERS,
            event_workers: DEFAULT_EVENT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            vocabulary_path: default_vocabulary_path(),
            vocabulary_interval_secs: DEFAULT_VOCABULARY_INTERVAL_SECS,
        }
    }
}

impl EngineConfig {
    pub fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Snapshot period, never shorter than one second
    pub fn vocabulary_interval(&self) -> Duration {
        Duration::from_secs(self.vocabulary_interval_secs.max(MIN_VOCABULARY_INTERVAL_SECS))
    }

    /// Load config from file in the app data directory
    /// Returns None if file doesn't exist or can't be parsed
    fn load_from_file() -> Option<ConfigFile> {
        let config_path = get_config_path().ok()?;
        if !config_path.exists() {
            return None;
        }

        let content = fs::read_to_string(&config_path).ok()?;
        match toml::from_str(&content) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("ignoring {}: {}", config_path.display(), e);
                None
            }
        }
    }

    /// Load config with priority: environment variables > config file > defaults
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(file) = Self::load_from_file() {
            config.apply_file(file);
        }
        config.apply_env();
        config
    }

    /// Overlay values present in a parsed config file
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.ingest.workers {
            self.ingest_workers = v;
        }
        if let Some(v) = file.events.workers_per_index {
            self.event_workers = v;
        }
        if let Some(v) = file.events.queue_capacity {
            self.queue_capacity = v;
        }
        if let Some(v) = file.watcher.debounce_ms {
            self.debounce_ms = v;
        }
        if let Some(v) = file.vocabulary.path {
            self.vocabulary_path = v;
        }
        if let Some(v) = file.vocabulary.interval_secs {
            self.vocabulary_interval_secs = v;
        }
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_parse("MINIDEX_INGEST_WORKERS") {
            self.ingest_workers = v;
        }
        if let Some(v) = env_parse("MINIDEX_EVENT_WORKERS") {
            self.event_workers = v;
        }
        if let Some(v) = env_parse("MINIDEX_QUEUE_CAPACITY") {
            self.queue_capacity = v;
        }
        if let Some(v) = env_parse("MINIDEX_DEBOUNCE_MS") {
            self.debounce_ms = v;
        }
        if let Ok(v) = std::env::var("MINIDEX_VOCABULARY_PATH") {
            self.vocabulary_path = PathBuf::from(v);
        }
        if let Some(v) = env_parse("MINIDEX_VOCABULARY_INTERVAL_SECS") {
            self.vocabulary_interval_secs = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.ingest_workers, DEFAULT_INGEST_WORKERS);
        assert_eq!(config.event_workers, DEFAULT_EVENT_WORKERS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.debounce_duration(), Duration::from_millis(DEFAULT_DEBOUNCE_MS));
        assert_eq!(config.vocabulary_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_file_parse_full() {
        let toml_content = r#"
[ingest]
workers = 8

[events]
workers_per_index = 3
queue_capacity = 512

[watcher]
debounce_ms = 1000

[vocabulary]
path = "/tmp/vocab.txt"
interval_secs = 5
"#;

        let file: ConfigFile = toml::from_str(toml_content).unwrap();
        let mut config = EngineConfig::default();
        config.apply_file(file);

        assert_eq!(config.ingest_workers, 8);
        assert_eq!(config.event_workers, 3);
        assert_eq!(config.queue_capacity, 512);
        assert_eq!(config.debounce_ms, 1000);
        assert_eq!(config.vocabulary_path, PathBuf::from("/tmp/vocab.txt"));
        assert_eq!(config.vocabulary_interval_secs, 5);
    }

    #[test]
    fn test_config_file_parse_partial() {
        let toml_content = r#"
[events]
queue_capacity = 20
"#;

        let file: ConfigFile = toml::from_str(toml_content).unwrap();
        assert_eq!(file.events.queue_capacity, Some(20));
        assert_eq!(file.events.workers_per_index, None);
        assert_eq!(file.ingest.workers, None);

        let mut config = EngineConfig::default();
        config.apply_file(file);
        assert_eq!(config.queue_capacity, 20);
        assert_eq!(config.ingest_workers, DEFAULT_INGEST_WORKERS);
    }

    #[test]
    fn test_config_file_parse_empty() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(file.watcher.debounce_ms, None);
        assert_eq!(file.vocabulary.path, None);
    }

    #[test]
    fn test_vocabulary_interval_clamped() {
        let config = EngineConfig {
            vocabulary_interval_secs: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.vocabulary_interval(), Duration::from_secs(1));
    }

    // Environment overrides are not tested here: tests run in parallel and
    // mutating process-wide env vars races with other tests.
}
