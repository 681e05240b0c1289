//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::index::IndexStats;
use crate::query::{PhraseStrategy, WildcardStrategy};

/// Largest message either side will accept
const MAX_MESSAGE_BYTES: usize = 100 * 1024 * 1024;

/// Request from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Postfix boolean expression
    Boolean { query: String },

    /// Exact phrase
    Phrase {
        phrase: String,
        #[serde(default)]
        strategy: PhraseStrategy,
    },

    /// Wildcard pattern over the vocabulary
    Wildcard {
        pattern: String,
        #[serde(default)]
        strategy: WildcardStrategy,
    },

    /// Check server health and get stats
    Status,

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

/// Response from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Matching documents (boolean and phrase queries)
    Documents(DocumentsResponse),

    /// Matching vocabulary terms (wildcard queries)
    Terms(TermsResponse),

    /// Server status
    Status(StatusResponse),

    /// Shutdown acknowledged
    ShuttingDown,

    /// Pong response
    Pong,

    /// Error response
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsResponse {
    /// Sorted document paths
    pub paths: Vec<PathBuf>,
    /// Time taken in milliseconds
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsResponse {
    /// Sorted terms
    pub terms: Vec<String>,
    pub duration_ms: f64,
}

/// Server status response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Directory being indexed
    pub root_path: PathBuf,
    /// Total queries served
    pub queries_served: u64,
    pub stats: IndexStats,
}

fn invalid_data<E>(e: E) -> std::io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(invalid_data)?;
    if json.len() > MAX_MESSAGE_BYTES {
        return Err(invalid_data("Message too large"));
    }

    let len = json.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_BYTES {
        return Err(invalid_data("Message too large"));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(invalid_data)
}
