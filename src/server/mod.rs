//! Long-running query server
//!
//! `minidex serve` ingests a folder, keeps watching it and answers queries
//! on a per-user Unix socket. The CLI talks to it through [`QueryClient`]
//! and falls back to an in-process engine when no server is running.

mod client;
pub mod daemon;
pub mod debouncer;
pub mod protocol;
pub mod watcher;

pub use client::{ClientError, ClientResult, QueryClient};

use std::path::PathBuf;

/// Per-user runtime directory for the socket and pid file
fn runtime_path(file_name: &str) -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(file_name);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("run").join(file_name);
    }

    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/minidex-{}", uid)).join(file_name)
}

pub fn get_socket_path() -> PathBuf {
    runtime_path("minidex.sock")
}

pub fn get_pid_path() -> PathBuf {
    runtime_path("minidex.pid")
}

/// Check if a server process is alive
pub fn is_daemon_running() -> bool {
    let Ok(pid_str) = std::fs::read_to_string(get_pid_path()) else {
        return false;
    };

    match pid_str.trim().parse::<i32>() {
        // kill(pid, 0) only probes for existence
        Ok(pid) => unsafe { libc::kill(pid, 0) == 0 },
        Err(_) => false,
    }
}
