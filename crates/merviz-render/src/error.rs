//! Render pipeline error definitions.

use std::time::Duration;

use merviz_core::ErrorKind;
use thiserror::Error;

/// Type alias for Results within the render pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for render orchestration.
///
/// The variants follow the failure taxonomy of the pipeline: input errors
/// fail fast, engine errors carry the engine's own diagnostics verbatim,
/// extraction errors mean the expected artifact was absent or unusable.
#[derive(Debug, Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// The diagram source was empty or whitespace-only.
    #[error("diagram source must not be empty")]
    EmptySource,

    /// A render option failed validation.
    #[error("invalid render option: {0}")]
    InvalidOption(String),

    /// The engine binary could not be started.
    #[error("failed to start rendering engine `{command}`: {message}")]
    EngineStartup {
        /// Executable that failed to start.
        command: String,
        /// Underlying spawn failure.
        message: String,
    },

    /// The engine produced no completion signal within the bound.
    #[error("rendering engine produced no result within {timeout:?}")]
    EngineTimeout {
        /// The completion bound that was exceeded.
        timeout: Duration,
    },

    /// The engine reported an error in the diagram source.
    ///
    /// The detail carries the engine's own message verbatim so callers can
    /// see the actual parse or layout failure.
    #[error("rendering engine reported an error: {detail}")]
    EngineFailure {
        /// Engine stderr, trimmed.
        detail: String,
    },

    /// The expected output artifact was absent, empty or malformed.
    #[error("output extraction failed: {0}")]
    Extraction(String),

    /// Raster post-processing failed.
    #[error("image processing failed: {0}")]
    Image(String),

    /// Filesystem or pipe error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps this error into the workspace-wide error kind taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySource | Self::InvalidOption(_) => ErrorKind::InvalidInput,
            Self::EngineStartup { .. } => ErrorKind::EngineStartup,
            Self::EngineTimeout { .. } => ErrorKind::EngineTimeout,
            Self::EngineFailure { .. } => ErrorKind::EngineFailure,
            Self::Extraction(_) | Self::Image(_) => ErrorKind::Extraction,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether a fresh invocation could plausibly succeed.
    ///
    /// Engine data errors and input errors are deterministic and never
    /// retried; startup failures and timeouts are transport-level.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineStartup { .. } | Self::EngineTimeout { .. })
    }
}
