//! Artifact upload with retention metadata.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use merviz_core::content_type_for_extension;
use minio::s3::multimap::Multimap;
use minio::s3::segmented_bytes::SegmentedBytes;
use minio::s3::types::S3Api;
use tokio::time::sleep;
use uuid::Uuid;

use crate::client::MinioClient;
use crate::types::{RetentionMetadata, UploadRecord};
use crate::{Error, Result, TRACING_TARGET_OBJECTS};

/// Attempt bound for uploads of a single artifact.
pub const UPLOAD_ATTEMPTS: u32 = 3;

/// Options for one artifact upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Caller-provided object key; a collision-resistant name is
    /// generated when absent.
    pub object_key: Option<String>,
    /// Requested retention window in days; clamped, never rejected.
    pub retention_days: Option<i64>,
}

impl MinioClient {
    /// Uploads a rendered artifact and returns its public URL record.
    ///
    /// The object carries retention metadata derived from the clamped
    /// retention window; the content type is derived from the artifact's
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact cannot be read or the upload
    /// fails.
    pub async fn upload_artifact(
        &self,
        artifact: &Path,
        options: &UploadOptions,
    ) -> Result<UploadRecord> {
        let data = tokio::fs::read(artifact)
            .await
            .map_err(|_| Error::ArtifactNotFound(artifact.display().to_string()))?;
        let size = data.len() as u64;

        let extension = artifact
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let original_filename = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact")
            .to_owned();

        let key = options
            .object_key
            .clone()
            .unwrap_or_else(|| generated_key(extension));

        let retention = RetentionMetadata::new(
            options.retention_days.unwrap_or_default(),
            &original_filename,
        );

        // retention travels as x-amz-meta-* headers, read back by the
        // sweep via stat_object
        let mut headers = Multimap::new();
        headers.insert(
            "Content-Type".to_owned(),
            content_type_for_extension(extension).to_owned(),
        );
        for (meta_key, meta_value) in retention.to_metadata() {
            headers.insert(format!("x-amz-meta-{meta_key}"), meta_value);
        }

        tracing::debug!(
            target: TRACING_TARGET_OBJECTS,
            bucket = %self.bucket(),
            key = %key,
            size,
            retention_days = retention.retention_days,
            "uploading artifact"
        );

        let start = std::time::Instant::now();
        let response = self
            .as_inner()
            .put_object(
                self.bucket(),
                &key,
                SegmentedBytes::from(Bytes::from(data)),
            )
            .extra_headers(Some(headers))
            .send()
            .await
            .map_err(Error::Client)?;

        tracing::info!(
            target: TRACING_TARGET_OBJECTS,
            bucket = %self.bucket(),
            key = %key,
            size,
            etag = %response.etag,
            elapsed = ?start.elapsed(),
            "artifact uploaded"
        );

        Ok(UploadRecord {
            public_url: self.public_url(&key),
            object_key: key,
            size_bytes: size,
            uploaded_at: retention.uploaded_at,
            expires_at: retention.expires_at,
            retention_days: retention.retention_days,
        })
    }

    /// Uploads with bounded retries and linear backoff.
    ///
    /// Transient failures (network, storage client) are retried up to
    /// [`UPLOAD_ATTEMPTS`] times with `attempt × 1s` backoff; permanent
    /// failures return immediately.
    ///
    /// # Errors
    ///
    /// Returns the last error after all attempts are exhausted.
    pub async fn upload_artifact_with_retry(
        &self,
        artifact: &Path,
        options: &UploadOptions,
    ) -> Result<UploadRecord> {
        let mut last_error = None;
        for attempt in 1..=UPLOAD_ATTEMPTS {
            match self.upload_artifact(artifact, options).await {
                Ok(record) => return Ok(record),
                Err(err) if err.is_transient() && attempt < UPLOAD_ATTEMPTS => {
                    let backoff = Duration::from_secs(u64::from(attempt));
                    tracing::warn!(
                        target: TRACING_TARGET_OBJECTS,
                        attempt,
                        backoff = ?backoff,
                        error = %err,
                        "upload attempt failed, retrying"
                    );
                    last_error = Some(err);
                    sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
        // unreachable in practice: the loop either returned a record or
        // the final attempt's error
        Err(last_error.unwrap_or_else(|| Error::Config("upload attempts exhausted".to_owned())))
    }
}

fn generated_key(extension: &str) -> String {
    if extension.is_empty() {
        format!("mermaid-{}", Uuid::new_v4())
    } else {
        format!("mermaid-{}.{extension}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_is_unique_and_keeps_extension() {
        let a = generated_key("png");
        let b = generated_key("png");
        assert_ne!(a, b);
        assert!(a.starts_with("mermaid-"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn test_generated_key_without_extension() {
        let key = generated_key("");
        assert!(key.starts_with("mermaid-"));
        assert!(!key.contains('.'));
    }
}
