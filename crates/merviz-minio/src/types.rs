//! Stored-object and retention types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{Error, Result};

/// Metadata key carrying the expiry timestamp (RFC 3339).
pub const META_EXPIRES_AT: &str = "expires-at-ts";

/// Metadata key carrying the clamped retention window in days.
pub const META_RETENTION_DAYS: &str = "retention-days";

/// Metadata key carrying the upload timestamp (RFC 3339).
pub const META_UPLOADED_AT: &str = "uploaded-at-ts";

/// Metadata key carrying the artifact's original filename.
pub const META_ORIGINAL_FILENAME: &str = "original-filename";

/// Information about an object in the delivery bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp.
    pub last_modified: OffsetDateTime,
    /// ETag of the object.
    pub etag: Option<String>,
    /// Content type.
    pub content_type: Option<String>,
    /// User metadata.
    pub metadata: HashMap<String, String>,
}

impl StoredObject {
    /// Creates a new StoredObject.
    pub fn new(key: impl Into<String>, size: u64, last_modified: OffsetDateTime) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
            etag: None,
            content_type: None,
            metadata: HashMap::new(),
        }
    }

    /// Sets the ETag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets user metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Retention metadata attached to every uploaded artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionMetadata {
    /// When the artifact was uploaded.
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// When the artifact becomes eligible for deletion.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Clamped retention window in days.
    pub retention_days: i64,
    /// Original filename of the artifact.
    pub original_filename: String,
}

impl RetentionMetadata {
    /// Builds retention metadata starting now for a clamped window.
    pub fn new(retention_days: i64, original_filename: impl Into<String>) -> Self {
        let retention_days = merviz_core::clamp_retention_days(retention_days);
        let uploaded_at = OffsetDateTime::now_utc();
        Self {
            uploaded_at,
            expires_at: uploaded_at + time::Duration::days(retention_days),
            retention_days,
            original_filename: original_filename.into(),
        }
    }

    /// Whether the retention window has passed at the given instant.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Serializes into user-metadata key/value pairs.
    pub fn to_metadata(&self) -> Vec<(String, String)> {
        let format = |ts: OffsetDateTime| {
            ts.format(&Rfc3339)
                .unwrap_or_else(|_| ts.unix_timestamp().to_string())
        };
        vec![
            (META_UPLOADED_AT.to_owned(), format(self.uploaded_at)),
            (META_EXPIRES_AT.to_owned(), format(self.expires_at)),
            (
                META_RETENTION_DAYS.to_owned(),
                self.retention_days.to_string(),
            ),
            (
                META_ORIGINAL_FILENAME.to_owned(),
                self.original_filename.clone(),
            ),
        ]
    }

    /// Reads the expiry timestamp out of a stored object's metadata map.
    ///
    /// # Errors
    ///
    /// Returns an invalid-metadata error when the expiry key is absent or
    /// unparseable.
    pub fn expiry_from_metadata(
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<OffsetDateTime> {
        let raw = metadata
            .get(META_EXPIRES_AT)
            .ok_or_else(|| Error::InvalidMetadata {
                key: key.to_owned(),
                message: format!("missing `{META_EXPIRES_AT}`"),
            })?;
        OffsetDateTime::parse(raw, &Rfc3339).map_err(|e| Error::InvalidMetadata {
            key: key.to_owned(),
            message: format!("unparseable `{META_EXPIRES_AT}`: {e}"),
        })
    }
}

/// Record of a completed artifact upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Object key the artifact was stored under.
    pub object_key: String,
    /// Uploaded size in bytes.
    pub size_bytes: u64,
    /// When the upload completed.
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// When the object becomes eligible for deletion.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Clamped retention window in days.
    pub retention_days: i64,
    /// Public URL of the uploaded object.
    pub public_url: String,
}
