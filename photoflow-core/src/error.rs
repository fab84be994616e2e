//! Error types for pipeline execution

use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A content loader failed for the given observation
    #[error("loader failed for {}", identifier.display())]
    Loader {
        /// Identifier of the observation whose loader failed
        identifier: PathBuf,
        /// The underlying loader failure
        #[source]
        source: anyhow::Error,
    },

    /// An unhandled failure escaped a stage while an observation was in flight
    #[error("stage '{stage}' failed on {}", identifier.display())]
    Stage {
        /// Name of the stage that failed
        stage: String,
        /// Identifier of the observation in flight
        identifier: PathBuf,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// External collaborator error
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Wrap an error with the stage and observation it was in flight through.
    ///
    /// Used by the pipeline executor to satisfy the fail-fast reporting
    /// contract: a terminated run names the stage and the identifier involved.
    pub fn in_stage(self, stage: impl Into<String>, identifier: impl Into<PathBuf>) -> Self {
        Error::Stage {
            stage: stage.into(),
            identifier: identifier.into(),
            source: Box::new(self),
        }
    }
}
