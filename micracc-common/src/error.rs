//! Common error types for the MICR accuracy harness

use thiserror::Error;

/// Common result type for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the harness crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed ground truth or override data for a single check
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found (check id, image file, fixture)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Recognition collaborator failure (local or remote)
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
