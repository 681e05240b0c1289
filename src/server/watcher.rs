//! Folder watcher feeding new and changed files into ingestion
//!
//! Create/modify events are debounced and the resulting batch is handed
//! to the [`Ingestor`]. Deletions are ignored: the indexes are append-only.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::ingest::Ingestor;
use crate::server::debouncer::{ChangeBatch, ChangeKind, EventDebouncer};

/// How often the watcher loop checks for shutdown and ready batches
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to a running watcher thread
pub struct WatcherHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    root_path: PathBuf,
}

impl WatcherHandle {
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Signal the watcher to stop and wait for it
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        _ => None,
    }
}

/// Submit every file of a batch the ingestor can read. Returns how many
/// were accepted.
pub fn submit_batch(ingestor: &Ingestor, batch: &ChangeBatch) -> usize {
    batch
        .paths()
        .filter(|path| path.is_file() && ingestor.readers().supports(path))
        .filter(|path| ingestor.submit(path))
        .count()
}

/// Start watching `root` recursively on a background thread
pub fn spawn_watcher(
    root: &Path,
    ingestor: Arc<Ingestor>,
    debounce: Duration,
) -> Result<WatcherHandle> {
    let root_path = root.to_path_buf();
    let shutdown = Arc::new(AtomicBool::new(false));
    let (event_tx, event_rx) = mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(e) => log::warn!("watch error: {}", e),
        },
        notify::Config::default(),
    )
    .context("Failed to create file watcher")?;

    watcher
        .watch(&root_path, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root_path.display()))?;

    let thread_shutdown = Arc::clone(&shutdown);
    let thread_root = root_path.clone();
    let thread = thread::Builder::new()
        .name("watcher".to_string())
        .spawn(move || {
            // The watcher must outlive the loop or events stop arriving
            let _watcher = watcher;
            run_watch_loop(&thread_root, event_rx, &ingestor, debounce, &thread_shutdown);
        })
        .context("Failed to spawn watcher thread")?;

    log::info!("watching {} for changes", root_path.display());

    Ok(WatcherHandle {
        shutdown,
        thread: Some(thread),
        root_path,
    })
}

fn run_watch_loop(
    root: &Path,
    events: mpsc::Receiver<Event>,
    ingestor: &Ingestor,
    debounce: Duration,
    shutdown: &AtomicBool,
) {
    let mut debouncer = EventDebouncer::new(debounce);

    while !shutdown.load(Ordering::Relaxed) {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                let Some(kind) = change_kind(&event.kind) else {
                    continue;
                };
                for path in event.paths {
                    // Removed paths no longer exist, everything else must be a file
                    if kind != ChangeKind::Deleted && !path.is_file() {
                        continue;
                    }
                    log::debug!("[watch] {:?} {}", kind, path.display());
                    debouncer.add_event(path, kind);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if debouncer.has_pending() && debouncer.is_ready() {
            if let Some(batch) = debouncer.flush() {
                let submitted = submit_batch(ingestor, &batch);
                log::info!(
                    "{} changes under {}, {} submitted",
                    batch.total_changes(),
                    root.display(),
                    submitted
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DocumentRegistry, EventBus};
    use crate::ingest::ReaderRegistry;
    use std::fs;
    use tempfile::TempDir;

    fn ingestor() -> (Arc<DocumentRegistry>, Arc<Ingestor>) {
        let registry = Arc::new(DocumentRegistry::new());
        let bus = Arc::new(EventBus::new(1, 16));
        let ingestor =
            Ingestor::new(ReaderRegistry::default(), Arc::clone(&registry), bus, 1).unwrap();
        (registry, Arc::new(ingestor))
    }

    #[test]
    fn test_change_kind_mapping() {
        use notify::event::{CreateKind, ModifyKind, RemoveKind};
        assert_eq!(
            change_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            change_kind(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Deleted)
        );
        assert_eq!(change_kind(&EventKind::Any), None);
    }

    #[test]
    fn test_submit_batch_filters_unsupported_and_missing() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("a.txt");
        let bin = dir.path().join("b.bin");
        fs::write(&txt, "hello").unwrap();
        fs::write(&bin, "hello").unwrap();

        let batch = ChangeBatch {
            created: vec![txt.clone(), bin, dir.path().join("gone.txt")],
            modified: vec![txt],
        };

        let (registry, ingestor) = ingestor();
        assert_eq!(submit_batch(&ingestor, &batch), 1);
        assert!(ingestor.wait_idle(Duration::from_secs(5)));
        assert_eq!(registry.document_count(), 1);
    }

    #[test]
    fn test_stop_watcher() {
        let dir = TempDir::new().unwrap();
        let (_, ingestor) = ingestor();

        let mut handle = spawn_watcher(dir.path(), ingestor, Duration::from_millis(10)).unwrap();
        assert!(handle.is_running());
        assert_eq!(handle.root_path(), dir.path());

        handle.stop();
        assert!(!handle.is_running());
    }
}
