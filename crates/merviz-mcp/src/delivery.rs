//! The delivery resolver.
//!
//! Invoked only after a successful render and only when the request asked
//! for delivery. Render success and delivery success are independent: a
//! failed upload leaves the render result successful and records the
//! delivery failure next to it.

use std::path::Path;
use std::time::Duration;

use merviz_core::{Error, Result};
use merviz_hosting::ImageHost;
use merviz_minio::{MinioClient, UploadOptions};
use merviz_render::{DeliveryMode, RenderOptions, RenderResult};
use tokio::time::sleep;

use crate::TRACING_TARGET_DELIVERY;
use crate::service::McpService;

/// Attempt bound for image-hosting uploads.
const HOSTING_ATTEMPTS: u32 = 3;

impl McpService {
    /// Resolves delivery for a finished render, filling `online_url` or
    /// `delivery_error` in place.
    pub async fn deliver(&self, result: &mut RenderResult, options: &RenderOptions) {
        if !result.success {
            return;
        }
        let Some(artifact) = result.artifact_path.clone() else {
            return;
        };
        let Ok(resolved) = options.resolve() else {
            // an unresolvable option set cannot have passed the render
            return;
        };

        let outcome = match resolved.delivery {
            DeliveryMode::None => return,
            DeliveryMode::LocalServer => self.deliver_local(&artifact).await,
            DeliveryMode::RemoteUpload => {
                self.deliver_remote(&artifact, resolved.retention_days).await
            }
        };

        match outcome {
            Ok(url) => {
                tracing::info!(
                    target: TRACING_TARGET_DELIVERY,
                    url = %url,
                    artifact = %artifact.display(),
                    "artifact delivered"
                );
                result.online_url = Some(url);
            }
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET_DELIVERY,
                    error = %e,
                    artifact = %artifact.display(),
                    "delivery failed, render result kept"
                );
                result.delivery_error = Some(e.to_string());
            }
        }
    }

    async fn deliver_local(&self, artifact: &Path) -> Result<String> {
        self.ensure_static_server().await?;
        self.served_file_url(artifact).await
    }

    async fn deliver_remote(&self, artifact: &Path, retention_days: Option<i64>) -> Result<String> {
        let config = self.config().snapshot();
        let retention_days = retention_days.unwrap_or(config.retention_days);

        if let Some(settings) = config.minio {
            let client = MinioClient::new(settings).map_err(|e| {
                Error::delivery()
                    .with_message(format!("storage upload failed: {e}"))
                    .with_source(e)
            })?;
            let record = client
                .upload_artifact_with_retry(
                    artifact,
                    &UploadOptions {
                        object_key: None,
                        retention_days: Some(retention_days),
                    },
                )
                .await
                .map_err(|e| {
                    Error::delivery()
                        .with_message(format!("storage upload failed: {e}"))
                        .with_source(e)
                })?;
            return Ok(record.public_url);
        }

        if let Some(settings) = config.hosting {
            return self.deliver_hosted(artifact, settings).await;
        }

        Err(Error::delivery().with_message("no remote delivery backend configured"))
    }

    async fn deliver_hosted(
        &self,
        artifact: &Path,
        settings: merviz_core::HostingSettings,
    ) -> Result<String> {
        let host = ImageHost::new(settings);
        let mut last_error = None;
        for attempt in 1..=HOSTING_ATTEMPTS {
            match host.upload(artifact).await {
                Ok(url) => return Ok(url),
                Err(e) if e.is_transient() && attempt < HOSTING_ATTEMPTS => {
                    let backoff = Duration::from_secs(u64::from(attempt));
                    tracing::warn!(
                        target: TRACING_TARGET_DELIVERY,
                        attempt,
                        backoff = ?backoff,
                        error = %e,
                        "image hosting upload failed, retrying"
                    );
                    last_error = Some(e);
                    sleep(backoff).await;
                }
                Err(e) => {
                    return Err(Error::delivery()
                        .with_message(format!("image hosting upload failed: {e}"))
                        .with_source(e));
                }
            }
        }
        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "upload attempts exhausted".to_owned());
        Err(Error::delivery().with_message(format!("image hosting upload failed: {detail}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use merviz_core::{ConfigHandle, MinioSettings, RenderFormat, ServerConfig};
    use merviz_render::Renderer;

    use super::*;

    fn render_options(delivery: DeliveryMode) -> RenderOptions {
        RenderOptions {
            format: Some(RenderFormat::Svg),
            delivery: Some(delivery),
            ..RenderOptions::default()
        }
    }

    fn success_result(artifact: std::path::PathBuf) -> RenderResult {
        RenderResult::success(artifact, "svg", None, 6, 1)
    }

    fn service_with(
        root: &std::path::Path,
        minio: Option<MinioSettings>,
    ) -> Arc<McpService> {
        let config = ConfigHandle::new(ServerConfig {
            server_port: 0,
            output_dir: root.join("output"),
            temp_dir: root.join("temp"),
            minio,
            hosting: None,
            ..ServerConfig::default()
        });
        let renderer = Renderer::new(config.clone());
        McpService::with_renderer(config, renderer)
    }

    #[tokio::test]
    async fn test_no_backend_keeps_render_success_and_reports_delivery_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(dir.path(), None);

        let artifact = dir.path().join("output/chart.svg");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, "<svg/>").unwrap();

        let mut result = success_result(artifact);
        service
            .deliver(&mut result, &render_options(DeliveryMode::RemoteUpload))
            .await;

        assert!(result.success);
        assert!(result.online_url.is_none());
        assert!(
            result
                .delivery_error
                .as_deref()
                .unwrap()
                .contains("no remote delivery backend")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_unreachable_storage_keeps_render_success() {
        let dir = tempfile::tempdir().unwrap();
        // discard port: connections are refused immediately
        let service = service_with(
            dir.path(),
            Some(MinioSettings {
                endpoint: "http://127.0.0.1:1".to_owned(),
                access_key: "access".to_owned(),
                secret_key: "secret".to_owned(),
                bucket: "mermaid-charts".to_owned(),
                region: None,
                public_base_url: None,
            }),
        );

        let artifact = dir.path().join("output/chart.svg");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, "<svg/>").unwrap();

        let mut result = success_result(artifact);
        service
            .deliver(&mut result, &render_options(DeliveryMode::RemoteUpload))
            .await;

        assert!(result.success, "render success is independent of delivery");
        assert!(result.online_url.is_none());
        assert!(
            result
                .delivery_error
                .as_deref()
                .unwrap()
                .contains("storage upload failed")
        );
    }

    #[tokio::test]
    async fn test_local_delivery_produces_served_url() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(dir.path(), None);

        let artifact = dir.path().join("output/chart.svg");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, "<svg/>").unwrap();

        let mut result = success_result(artifact);
        service
            .deliver(&mut result, &render_options(DeliveryMode::LocalServer))
            .await;

        assert!(result.success);
        assert!(result.delivery_error.is_none(), "{:?}", result.delivery_error);
        let url = result.online_url.unwrap();
        assert!(url.ends_with("/files/chart.svg"));
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_delivery_none_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(dir.path(), None);

        let mut result = success_result(dir.path().join("output/chart.svg"));
        service
            .deliver(&mut result, &render_options(DeliveryMode::None))
            .await;

        assert!(result.online_url.is_none());
        assert!(result.delivery_error.is_none());
    }

    #[tokio::test]
    async fn test_failed_render_is_never_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(dir.path(), None);

        let mut result =
            RenderResult::failure(&merviz_render::Error::EmptySource, "svg", 0);
        service
            .deliver(&mut result, &render_options(DeliveryMode::LocalServer))
            .await;

        assert!(result.online_url.is_none());
        assert!(result.delivery_error.is_none());
        assert!(!service.static_server_running().await);
    }
}
