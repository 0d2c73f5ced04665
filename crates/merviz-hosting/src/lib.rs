#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constant for consistent logging
pub const TRACING_TARGET_HOSTING: &str = "merviz_hosting::upload";

pub mod providers;

pub use crate::providers::ImageHost;

/// Error type for image-hosting uploads.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// The selected provider is missing required settings.
    #[error("image hosting not configured: {0}")]
    NotConfigured(String),

    /// The artifact to upload is missing or unreadable.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The provider rejected the upload.
    #[error("upload rejected by {provider}: {message}")]
    Rejected {
        /// Provider that rejected the upload.
        provider: String,
        /// Provider's own error message.
        message: String,
    },

    /// The provider's response could not be interpreted.
    #[error("unexpected response from {provider}: {message}")]
    InvalidResponse {
        /// Provider the response came from.
        provider: String,
        /// What was unexpected about it.
        message: String,
    },

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_))
    }
}

/// Type alias for Results with the hosting Error type.
pub type Result<T> = std::result::Result<T, Error>;
