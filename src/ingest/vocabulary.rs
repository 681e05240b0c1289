//! Periodic vocabulary snapshot
//!
//! Writes the dictionary's terms, one per line, whenever they changed
//! since the last successful write.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::index::Dictionary;

pub struct VocabularySnapshot {
    dictionary: Arc<Dictionary>,
    path: PathBuf,
    last_saved: Mutex<Option<u64>>,
}

fn vocabulary_hash(terms: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    terms.hash(&mut hasher);
    hasher.finish()
}

fn write_terms(path: &Path, terms: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Write next to the target and rename so readers never see a partial file
    let tmp_path = path.with_extension("txt.tmp");
    {
        let mut file = BufWriter::new(
            File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?,
        );
        for term in terms {
            writeln!(file, "{}", term)?;
        }
        file.flush()?;
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move vocabulary to {}", path.display()))?;
    Ok(())
}

impl VocabularySnapshot {
    pub fn new(dictionary: Arc<Dictionary>, path: PathBuf) -> Self {
        Self {
            dictionary,
            path,
            last_saved: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the vocabulary if it changed. Returns whether a file was written.
    pub fn save_if_changed(&self) -> Result<bool> {
        let terms = self.dictionary.vocabulary();
        let hash = vocabulary_hash(&terms);

        let mut last_saved = self.last_saved.lock();
        if *last_saved == Some(hash) {
            log::info!("vocabulary unchanged, skipping save");
            return Ok(false);
        }

        write_terms(&self.path, &terms)?;
        *last_saved = Some(hash);
        log::info!("saved {} terms to {}", terms.len(), self.path.display());
        Ok(true)
    }

    /// One scheduled run. Failures are logged and retried on the next run.
    pub fn tick(&self) {
        if let Err(e) = self.save_if_changed() {
            log::error!("failed to save vocabulary: {:#}", e);
        }
    }

    /// Run [`tick`](Self::tick) every `interval` on a background thread
    pub fn spawn(self: Arc<Self>, interval: Duration) -> Result<SnapshotHandle> {
        let (stop, stopped) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("vocabulary".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => self.tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .context("Failed to spawn vocabulary thread")?;

        Ok(SnapshotHandle { stop, thread })
    }
}

/// Stops the periodic snapshot when asked to or when dropped
pub struct SnapshotHandle {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl SnapshotHandle {
    pub fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.thread.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dictionary(terms: &[&str]) -> Arc<Dictionary> {
        let dict = Arc::new(Dictionary::new());
        for t in terms {
            dict.record(t);
        }
        dict
    }

    #[test]
    fn test_saves_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("vocabulary.txt");
        let dict = dictionary(&["world", "hello"]);
        let snapshot = VocabularySnapshot::new(Arc::clone(&dict), path.clone());

        assert!(snapshot.save_if_changed().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");

        // Same terms, more occurrences: nothing to write
        dict.record("hello");
        assert!(!snapshot.save_if_changed().unwrap());

        dict.record("again");
        assert!(snapshot.save_if_changed().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "again\nhello\nworld\n");
    }

    #[test]
    fn test_failed_write_is_retried() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("vocabulary.txt");
        fs::create_dir(&path).unwrap();

        let snapshot = VocabularySnapshot::new(dictionary(&["a"]), path.clone());
        assert!(snapshot.save_if_changed().is_err());
        snapshot.tick();

        fs::remove_dir(&path).unwrap();
        assert!(snapshot.save_if_changed().unwrap());
    }

    #[test]
    fn test_spawn_and_stop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vocabulary.txt");
        let snapshot = Arc::new(VocabularySnapshot::new(dictionary(&["x"]), path.clone()));

        let handle = Arc::clone(&snapshot)
            .spawn(Duration::from_millis(10))
            .unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !path.exists() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        handle.stop();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
    }
}
