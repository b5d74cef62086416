//! Error types for regbatch
//!
//! Two kinds of failure exist in the ingestion pipeline and they are kept
//! strictly apart: per-row/per-field problems are *data* (`RowError`,
//! collected into reports so one attempt yields a complete picture), while
//! the variants below stop processing immediately.

use thiserror::Error;

/// Result type for regbatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an operation outright
#[derive(Error, Debug)]
pub enum Error {
    /// Sheet structure violates the event schema; the whole file is
    /// rejected before any row is processed
    #[error("Header error: {0}")]
    Header(String),

    /// Operation attempted against an entity in a forbidden state
    /// (e.g. delete with a completed payment); nothing was mutated
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A multi-document write partially failed and compensation could not
    /// fully restore the prior state; requires operator attention
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
