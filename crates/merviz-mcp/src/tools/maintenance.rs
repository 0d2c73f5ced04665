//! Upload maintenance handlers.

use std::sync::Arc;

use merviz_core::{Error, Result};
use merviz_minio::MinioClient;
use serde_json::Value;

use crate::service::McpService;
use crate::tools::to_payload;

/// Sweeps expired uploads out of the delivery bucket.
pub async fn cleanup_expired_uploads(service: &Arc<McpService>) -> Result<Value> {
    let config = service.config().snapshot();
    let settings = config
        .minio
        .ok_or_else(|| Error::configuration().with_message("object storage is not configured"))?;

    let client = MinioClient::new(settings).map_err(|e| {
        Error::delivery()
            .with_message(format!("storage client unavailable: {e}"))
            .with_source(e)
    })?;

    let report = client.sweep_expired().await.map_err(|e| {
        Error::delivery()
            .with_message(format!("sweep failed: {e}"))
            .with_source(e)
    })?;

    to_payload(&report)
}

#[cfg(test)]
mod tests {
    use merviz_core::{ConfigHandle, ServerConfig};

    use super::*;

    #[tokio::test]
    async fn test_sweep_without_storage_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = McpService::new(ConfigHandle::new(ServerConfig {
            output_dir: dir.path().join("output"),
            temp_dir: dir.path().join("temp"),
            minio: None,
            ..ServerConfig::default()
        }));

        let err = cleanup_expired_uploads(&service).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
