//! Error types for photo stages

use thiserror::Error;

/// Error type for photo stage operations
#[derive(Error, Debug)]
pub enum Error {
    /// Core pipeline error
    #[error("pipeline error: {0}")]
    Core(#[from] photoflow_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Malformed or unsupported photo data
    #[error("format error: {0}")]
    Format(String),
}

/// Result type for photo stage operations
pub type Result<T> = std::result::Result<T, Error>;
