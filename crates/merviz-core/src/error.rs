//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source slot in the structured [`Error`] type so any error
/// implementing the standard `Error` trait can be attached while keeping
/// Send and Sync bounds for multi-threaded contexts.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors that can occur across merviz operations.
///
/// The categories mirror how callers are expected to react: invalid input
/// must be fixed by the caller, engine failures carry the engine's own
/// diagnostics, delivery failures are independent of render success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed; the request must be corrected, not retried.
    InvalidInput,
    /// The rendering engine binary or session could not be started.
    EngineStartup,
    /// The rendering engine produced no completion signal within the bound.
    EngineTimeout,
    /// The engine itself reported an error in the diagram source.
    ///
    /// This is a data error, not a system error; the engine's message is
    /// surfaced verbatim.
    EngineFailure,
    /// An expected output artifact was absent, empty or unreadable.
    Extraction,
    /// Upload or static-server delivery failed after the render succeeded.
    Delivery,
    /// Configuration error.
    Configuration,
    /// Network-related error occurred.
    Network,
    /// Filesystem or other I/O error.
    Io,
    /// Unknown error occurred.
    Unknown,
}

/// A structured error type for merviz operations.
#[derive(Debug, Error)]
#[error("{}{}", <&'static str>::from(kind), message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
#[must_use = "errors should be handled appropriately"]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new engine startup error.
    pub fn engine_startup() -> Self {
        Self::new(ErrorKind::EngineStartup)
    }

    /// Creates a new engine timeout error.
    pub fn engine_timeout() -> Self {
        Self::new(ErrorKind::EngineTimeout)
    }

    /// Creates a new engine failure error.
    pub fn engine_failure() -> Self {
        Self::new(ErrorKind::EngineFailure)
    }

    /// Creates a new extraction error.
    pub fn extraction() -> Self {
        Self::new(ErrorKind::Extraction)
    }

    /// Creates a new delivery error.
    pub fn delivery() -> Self {
        Self::new(ErrorKind::Delivery)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new network error.
    pub fn network() -> Self {
        Self::new(ErrorKind::Network)
    }

    /// Returns whether the failure is worth retrying.
    ///
    /// Engine data errors and invalid input are never retryable; transport
    /// level failures (startup, timeout, network) are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::EngineStartup | ErrorKind::EngineTimeout | ErrorKind::Network
        )
    }

    /// Returns the stable string form of the error kind.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::new(ErrorKind::Io)
            .with_message(source.to_string())
            .with_source(source)
    }
}
