#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_STARTUP: &str = "merviz_server::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "merviz_server::shutdown";
pub const TRACING_TARGET_FILES: &str = "merviz_server::files";

pub mod routes;
pub mod server;
pub mod url;

pub use crate::server::StaticServer;
pub use crate::url::file_url;

/// Error type for the static file server.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// The listener could not bind to the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Underlying bind failure.
        source: std::io::Error,
    },

    /// An artifact path escapes the served output directory.
    #[error("path `{0}` is outside the output directory")]
    OutsideOutputDir(std::path::PathBuf),

    /// Filesystem error while preparing or serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results with the server Error type.
pub type Result<T> = std::result::Result<T, Error>;
