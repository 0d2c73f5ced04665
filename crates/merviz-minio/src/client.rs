//! High-level client for the delivery bucket.
//!
//! Wraps the MinIO SDK with the settings shape used by the server
//! configuration, bucket bootstrap, object listing/stat/deletion and
//! public URL computation.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use merviz_core::MinioSettings;
use minio::s3::Client;
use minio::s3::creds::StaticProvider;
use minio::s3::types::{S3Api, ToStream};
use time::OffsetDateTime;

use crate::types::StoredObject;
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_OBJECTS};

/// Client for the artifact delivery bucket.
///
/// Cheap to clone; all operations target the configured bucket.
#[derive(Clone)]
pub struct MinioClient {
    inner: Client,
    settings: Arc<MinioSettings>,
}

impl MinioClient {
    /// Creates a client from delivery settings.
    ///
    /// Does not test connectivity; see [`MinioClient::connect`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the endpoint is invalid or the
    /// client cannot be built.
    pub fn new(settings: MinioSettings) -> Result<Self> {
        if settings.bucket.is_empty() {
            return Err(Error::Config("bucket name must not be empty".to_owned()));
        }
        if settings.access_key.is_empty() || settings.secret_key.is_empty() {
            return Err(Error::Config(
                "storage credentials must not be empty".to_owned(),
            ));
        }

        let endpoint = settings
            .endpoint
            .parse()
            .map_err(|e| Error::Config(format!("invalid endpoint URL: {e}")))?;

        let provider = Box::new(StaticProvider::new(
            &settings.access_key,
            &settings.secret_key,
            None,
        ));

        let inner = Client::new(endpoint, Some(provider), None, None)
            .map_err(|e| Error::Config(format!("failed to build storage client: {e}")))?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            endpoint = %settings.endpoint,
            bucket = %settings.bucket,
            "storage client initialized"
        );

        Ok(Self {
            inner,
            settings: Arc::new(settings),
        })
    }

    /// Creates a client and verifies connectivity and bucket presence,
    /// creating the bucket when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the server is unreachable or the bucket
    /// cannot be created.
    pub async fn connect(settings: MinioSettings) -> Result<Self> {
        let client = Self::new(settings)?;
        client.ensure_bucket().await?;
        Ok(client)
    }

    /// Delivery settings this client was built from.
    pub fn settings(&self) -> &MinioSettings {
        &self.settings
    }

    /// Bucket receiving uploads.
    pub fn bucket(&self) -> &str {
        &self.settings.bucket
    }

    pub(crate) fn as_inner(&self) -> &Client {
        &self.inner
    }

    /// Ensures the delivery bucket exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the existence check or creation fails.
    pub async fn ensure_bucket(&self) -> Result<()> {
        let bucket = self.bucket();
        let response = self
            .inner
            .bucket_exists(bucket)
            .send()
            .await
            .map_err(Error::Client)?;

        if response.exists {
            tracing::debug!(target: TRACING_TARGET_CLIENT, bucket = %bucket, "bucket exists");
            return Ok(());
        }

        tracing::info!(target: TRACING_TARGET_CLIENT, bucket = %bucket, "creating bucket");
        self.inner
            .create_bucket(bucket)
            .send()
            .await
            .map_err(Error::Client)?;
        Ok(())
    }

    /// Public URL of an object in the delivery bucket.
    ///
    /// Uses the configured public base URL when present (reverse-proxy
    /// setups), the raw endpoint otherwise.
    pub fn public_url(&self, key: &str) -> String {
        let base = self
            .settings
            .public_base_url
            .as_deref()
            .unwrap_or(&self.settings.endpoint)
            .trim_end_matches('/');
        format!("{base}/{}/{key}", self.settings.bucket)
    }

    /// Lists every object in the delivery bucket.
    ///
    /// # Errors
    ///
    /// Returns an error when a listing page cannot be fetched.
    pub async fn list_objects(&self) -> Result<Vec<StoredObject>> {
        let bucket = self.bucket();
        tracing::debug!(target: TRACING_TARGET_OBJECTS, bucket = %bucket, "listing objects");

        let mut stream = self
            .inner
            .list_objects(bucket)
            .recursive(true)
            .to_stream()
            .await;

        let mut objects = Vec::new();
        while let Some(page) = stream.next().await {
            let response = page.map_err(Error::Client)?;
            for entry in response.contents {
                let size = entry.size.unwrap_or(0) as u64;
                let last_modified = entry
                    .last_modified
                    .and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok())
                    .unwrap_or_else(OffsetDateTime::now_utc);

                let mut object = StoredObject::new(entry.name.clone(), size, last_modified);
                if let Some(etag) = entry.etag {
                    object = object.with_etag(etag);
                }
                objects.push(object);
            }
        }

        tracing::debug!(
            target: TRACING_TARGET_OBJECTS,
            bucket = %bucket,
            count = objects.len(),
            "objects listed"
        );
        Ok(objects)
    }

    /// Fetches metadata for one object without downloading it.
    ///
    /// # Errors
    ///
    /// Returns an error when the object does not exist or the stat fails.
    pub async fn stat_object(&self, key: &str) -> Result<StoredObject> {
        let bucket = self.bucket();
        let response = self
            .inner
            .stat_object(bucket, key)
            .send()
            .await
            .map_err(Error::Client)?;

        let last_modified = response
            .last_modified
            .and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok())
            .unwrap_or_else(OffsetDateTime::now_utc);

        let mut object =
            StoredObject::new(key, response.size as u64, last_modified).with_etag(response.etag);

        if let Some(content_type) = response
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
        {
            object = object.with_content_type(content_type);
        }

        // user metadata comes back as x-amz-meta-* headers
        let metadata: HashMap<String, String> = response
            .headers
            .iter()
            .filter_map(|(k, v)| {
                let key = k.as_str().strip_prefix("x-amz-meta-")?.to_string();
                let value = v.to_str().ok()?.to_string();
                Some((key, value))
            })
            .collect();
        Ok(object.with_metadata(metadata))
    }

    /// Deletes an object from the delivery bucket.
    ///
    /// # Errors
    ///
    /// Returns an error when the deletion fails.
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let bucket = self.bucket();
        self.inner
            .delete_object(bucket, key)
            .send()
            .await
            .map_err(Error::Client)?;
        tracing::info!(
            target: TRACING_TARGET_OBJECTS,
            bucket = %bucket,
            key = %key,
            "object deleted"
        );
        Ok(())
    }
}
