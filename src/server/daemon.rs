//! Query server
//!
//! Owns an [`Engine`] fed by the folder watcher and serves queries over a
//! Unix socket, one thread per connection.

use anyhow::{Context, Result};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::server::protocol::{
    read_message, write_message, DocumentsResponse, Request, Response, StatusResponse,
    TermsResponse,
};
use crate::server::watcher::spawn_watcher;
use crate::server::{get_pid_path, get_socket_path};

/// Connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct QueryServer {
    engine: Arc<Engine>,
    root_path: PathBuf,
    start_time: Instant,
    queries_served: AtomicU64,
    shutdown: AtomicBool,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl QueryServer {
    pub fn new(engine: Arc<Engine>, root_path: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            engine,
            root_path,
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Accept connections on `socket_path` until a shutdown request (blocking)
    pub fn run(self: &Arc<Self>, socket_path: &Path) -> Result<()> {
        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Remove stale socket file
        if socket_path.exists() {
            fs::remove_file(socket_path)?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind to {}", socket_path.display()))?;

        // Set socket permissions (user only)
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(socket_path, fs::Permissions::from_mode(0o600))?;
        }

        log::info!("listening on {}", socket_path.display());

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
                    let _ = stream.set_write_timeout(Some(CONNECTION_TIMEOUT));

                    let server = Arc::clone(self);
                    let wake_path = socket_path.to_path_buf();
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            log::warn!("connection error: {:#}", e);
                        }
                        if server.shutdown.load(Ordering::SeqCst) {
                            // Unblock the accept loop so it sees the flag
                            let _ = UnixStream::connect(&wake_path);
                        }
                    });
                }
                Err(e) => log::warn!("accept error: {}", e),
            }
        }

        let _ = fs::remove_file(socket_path);
        log::info!("server stopped");
        Ok(())
    }

    /// Handle a single client connection
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            let request: Request = match read_message(&mut reader) {
                Ok(req) => req,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                break;
            }
        }

        Ok(())
    }

    /// Answer one request
    pub fn handle_request(&self, request: Request) -> Response {
        let start = Instant::now();

        let response = match request {
            Request::Boolean { query } => match self.engine.boolean_query(&query) {
                Ok(paths) => documents(paths, start),
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            },

            Request::Phrase { phrase, strategy } => {
                documents(self.engine.phrase_query(&phrase, strategy), start)
            }

            Request::Wildcard { pattern, strategy } => {
                match self.engine.wildcard_query(&pattern, strategy) {
                    Ok(found) => {
                        let mut terms: Vec<String> = found.into_iter().collect();
                        terms.sort_unstable();
                        Response::Terms(TermsResponse {
                            terms,
                            duration_ms: elapsed_ms(start),
                        })
                    }
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }

            Request::Status => return self.status(),

            Request::Shutdown => {
                log::info!("shutdown requested");
                self.shutdown.store(true, Ordering::SeqCst);
                return Response::ShuttingDown;
            }

            Request::Ping => return Response::Pong,
        };

        self.queries_served.fetch_add(1, Ordering::Relaxed);
        response
    }

    fn status(&self) -> Response {
        Response::Status(StatusResponse {
            uptime_secs: self.start_time.elapsed().as_secs(),
            root_path: self.root_path.clone(),
            queries_served: self.queries_served.load(Ordering::Relaxed),
            stats: self.engine.stats(),
        })
    }
}

fn documents(found: impl IntoIterator<Item = PathBuf>, start: Instant) -> Response {
    let mut paths: Vec<PathBuf> = found.into_iter().collect();
    paths.sort();
    Response::Documents(DocumentsResponse {
        paths,
        duration_ms: elapsed_ms(start),
    })
}

/// Index `root`, keep it up to date and serve queries until shut down
pub fn serve(root: &Path, config: EngineConfig) -> Result<()> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", root.display()))?;

    let engine = Arc::new(Engine::new(config)?);
    let config = engine.config().clone();

    let mut watcher = spawn_watcher(
        &root,
        Arc::clone(engine.ingestor()),
        config.debounce_duration(),
    )?;
    let submitted = engine.ingest_directory(&root)?;
    log::info!("indexing {} documents under {}", submitted, root.display());

    let snapshot = Arc::new(engine.vocabulary_snapshot());
    let snapshot_handle = Arc::clone(&snapshot).spawn(config.vocabulary_interval())?;

    let pid_path = get_pid_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, format!("{}", std::process::id()))?;

    let server = QueryServer::new(Arc::clone(&engine), root);
    let result = server.run(&get_socket_path());

    watcher.stop();
    snapshot_handle.stop();
    snapshot.tick();
    let _ = fs::remove_file(&pid_path);

    result
}

/// Stop the running server. Returns false if none was running.
pub fn stop_daemon() -> Result<bool> {
    if let Some(mut client) = crate::server::QueryClient::connect() {
        if client.shutdown().is_ok() {
            return Ok(true);
        }
    }

    let pid_path = get_pid_path();
    if !pid_path.exists() {
        return Ok(false);
    }

    let pid_str = fs::read_to_string(&pid_path)?;
    let pid: i32 = pid_str.trim().parse()?;

    // SIGTERM, then SIGKILL if it is still around
    unsafe {
        if libc::kill(pid, libc::SIGTERM) == 0 {
            thread::sleep(Duration::from_millis(500));
            if libc::kill(pid, 0) == 0 {
                thread::sleep(Duration::from_secs(1));
                if libc::kill(pid, 0) == 0 {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }

    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(&pid_path);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PhraseStrategy, WildcardStrategy};
    use crate::server::QueryClient;
    use tempfile::TempDir;

    fn server_with(docs: &[(&str, &str)]) -> (TempDir, Arc<QueryServer>) {
        let dir = TempDir::new().unwrap();
        for (name, text) in docs {
            fs::write(dir.path().join(name), text).unwrap();
        }

        let engine = Arc::new(Engine::new(EngineConfig::default()).unwrap());
        engine.ingest_directory(dir.path()).unwrap();
        assert!(engine.wait_until_indexed(Duration::from_secs(10)));

        let server = QueryServer::new(engine, dir.path().to_path_buf());
        (dir, server)
    }

    #[test]
    fn test_handle_requests() {
        let (dir, server) = server_with(&[("a.txt", "hello world"), ("b.txt", "hello there")]);

        match server.handle_request(Request::Boolean {
            query: "hello world NOT AND".to_string(),
        }) {
            Response::Documents(d) => assert_eq!(d.paths, vec![dir.path().join("b.txt")]),
            other => panic!("unexpected {:?}", other),
        }

        match server.handle_request(Request::Phrase {
            phrase: "hello world".to_string(),
            strategy: PhraseStrategy::Pair,
        }) {
            Response::Documents(d) => assert_eq!(d.paths, vec![dir.path().join("a.txt")]),
            other => panic!("unexpected {:?}", other),
        }

        match server.handle_request(Request::Wildcard {
            pattern: "*e*".to_string(),
            strategy: WildcardStrategy::Permuterm,
        }) {
            Response::Terms(t) => assert_eq!(t.terms, vec!["hello", "there"]),
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            server.handle_request(Request::Boolean { query: "AND".to_string() }),
            Response::Error { .. }
        ));
        assert_eq!(server.handle_request(Request::Ping), Response::Pong);

        match server.handle_request(Request::Status) {
            Response::Status(s) => {
                assert_eq!(s.queries_served, 4);
                assert_eq!(s.stats.documents, 2);
                assert_eq!(s.root_path, dir.path());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_socket_roundtrip_and_shutdown() {
        let (dir, server) = server_with(&[("a.txt", "socket test")]);
        let socket = dir.path().join("test.sock");

        let runner = Arc::clone(&server);
        let run_socket = socket.clone();
        let handle = thread::spawn(move || runner.run(&run_socket));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut client = loop {
            if let Some(c) = QueryClient::connect_to(&socket) {
                break c;
            }
            assert!(Instant::now() < deadline, "server did not start");
            thread::sleep(Duration::from_millis(20));
        };

        client.ping().unwrap();
        let paths = client.boolean("socket").unwrap();
        assert_eq!(paths, vec![dir.path().join("a.txt")]);
        client.shutdown().unwrap();

        handle.join().unwrap().unwrap();
        assert!(!socket.exists());
    }
}
