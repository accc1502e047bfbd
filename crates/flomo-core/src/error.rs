//! Error types for flomo-core

use thiserror::Error;

/// Result type alias using flomo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in flomo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Block or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The note source failed to serve a request
    #[error("Source error: {0}")]
    Source(String),

    /// The note source could not open its local storage
    #[error("Note storage unavailable: {0}")]
    SourceUnavailable(String),

    /// A block store mutation or lookup failed
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
