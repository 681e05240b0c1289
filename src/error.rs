use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while evaluating a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Stack underflow: operator `{token}` is missing operands")]
    StackUnderflow { token: String },

    #[error("Stack overflow: {remaining} operands left without an operator")]
    StackOverflow { remaining: usize },

    #[error("Invalid wildcard pattern `{0}`: at least one `*` is required")]
    InvalidPattern(String),
}

/// Errors raised while ingesting a single document.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No reader registered for `{0}`")]
    UnsupportedFile(PathBuf),

    #[error("Failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
