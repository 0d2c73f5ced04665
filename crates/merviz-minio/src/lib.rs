#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![allow(clippy::result_large_err, clippy::large_enum_variant)]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_CLIENT: &str = "merviz_minio::client";
pub const TRACING_TARGET_OBJECTS: &str = "merviz_minio::objects";
pub const TRACING_TARGET_SWEEP: &str = "merviz_minio::sweep";

pub mod client;
pub mod sweep;
pub mod types;
pub mod upload;

pub use crate::client::MinioClient;
pub use crate::sweep::SweepReport;
pub use crate::types::{RetentionMetadata, StoredObject, UploadRecord};
pub use crate::upload::{UPLOAD_ATTEMPTS, UploadOptions};

/// Error type for object-storage delivery operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// Configuration error.
    ///
    /// Invalid endpoint URLs, missing credentials or other issues with the
    /// storage settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// The artifact to upload is missing or unreadable.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Retention metadata on a stored object is missing or malformed.
    #[error("invalid retention metadata on {key}: {message}")]
    InvalidMetadata {
        /// Object the metadata belongs to.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying MinIO client error.
    ///
    /// Wraps errors from the minio crate that don't fit the other
    /// categories; treated as transient for retry purposes.
    #[error("storage client error: {0}")]
    Client(#[from] minio::s3::error::Error),
}

impl Error {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Client(_) | Error::Io(_))
    }
}

/// Type alias for Results with the storage Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(!Error::Config("bad endpoint".to_owned()).is_transient());
        assert!(!Error::ArtifactNotFound("/tmp/x.png".to_owned()).is_transient());
        let io: Error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert!(io.is_transient());
    }
}
