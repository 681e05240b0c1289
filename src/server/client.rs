//! Client for the query server

use crate::query::{PhraseStrategy, WildcardStrategy};
use crate::server::get_socket_path;
use crate::server::protocol::{read_message, write_message, Request, Response, StatusResponse};
use std::io::{BufReader, BufWriter};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(String),
    #[error("invalid response from server")]
    InvalidResponse,
}

pub struct QueryClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl QueryClient {
    /// Connect to the running server, None if there is none
    pub fn connect() -> Option<Self> {
        Self::connect_to(&get_socket_path())
    }

    pub fn connect_to(socket_path: &Path) -> Option<Self> {
        if !socket_path.exists() {
            return None;
        }

        let stream = UnixStream::connect(socket_path).ok()?;
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone().ok()?);
        let writer = BufWriter::new(stream);

        Some(Self { reader, writer })
    }

    /// Send one request and read its response. Server errors become
    /// [`ClientError::Server`].
    fn request(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { message } => Err(ClientError::Server(message)),
            response => Ok(response),
        }
    }

    fn documents(&mut self, request: &Request) -> ClientResult<Vec<PathBuf>> {
        match self.request(request)? {
            Response::Documents(docs) => Ok(docs.paths),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn boolean(&mut self, query: &str) -> ClientResult<Vec<PathBuf>> {
        self.documents(&Request::Boolean {
            query: query.to_string(),
        })
    }

    pub fn phrase(&mut self, phrase: &str, strategy: PhraseStrategy) -> ClientResult<Vec<PathBuf>> {
        self.documents(&Request::Phrase {
            phrase: phrase.to_string(),
            strategy,
        })
    }

    pub fn wildcard(
        &mut self,
        pattern: &str,
        strategy: WildcardStrategy,
    ) -> ClientResult<Vec<String>> {
        let request = Request::Wildcard {
            pattern: pattern.to_string(),
            strategy,
        };
        match self.request(&request)? {
            Response::Terms(terms) => Ok(terms.terms),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.request(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.request(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn ping(&mut self) -> ClientResult<()> {
        match self.request(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_to_missing_socket() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(QueryClient::connect_to(&dir.path().join("none.sock")).is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClientError::Server("empty query".into()).to_string(),
            "server error: empty query"
        );
    }
}
