//! Error types for tracelens-core

use thiserror::Error;

/// Main error type for the tracelens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Corpus discovery error (bad glob pattern, unreadable root)
    #[error("discovery error: {0}")]
    Discovery(String),

    /// A metric left its valid range. This indicates a counting bug
    /// and is never clamped or swallowed.
    #[error("metric invariant violated: {0}")]
    Invariant(String),
}

/// Result type alias for tracelens-core
pub type Result<T> = std::result::Result<T, Error>;
