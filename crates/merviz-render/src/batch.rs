//! Batch coordination over independent single renders.
//!
//! Items run under a concurrency cap (the engine is an expensive shared
//! resource) but results always come back in request order, and one item's
//! failure never aborts the rest.

use std::time::Instant;

use futures::StreamExt;
use futures::stream;

use crate::TRACING_TARGET_BATCH;
use crate::options::RenderOptions;
use crate::renderer::Renderer;
use crate::result::{BatchRequest, BatchResult};

impl Renderer {
    /// Renders every request of a batch, merging global options underneath
    /// each item's own options (item keys win).
    pub async fn render_batch(&self, request: BatchRequest) -> BatchResult {
        let started = Instant::now();
        let total = request.requests.len();
        let cap = self.config().snapshot().max_concurrent_renders.max(1);
        let global = request.global_options.unwrap_or_default();

        tracing::info!(
            target: TRACING_TARGET_BATCH,
            total,
            concurrency = cap,
            "starting batch render"
        );

        // buffered() polls up to `cap` renders at once while yielding
        // results in input order, so callers can correlate by index.
        let results: Vec<_> = stream::iter(request.requests.into_iter().map(|item| {
            let options = item
                .options
                .as_ref()
                .map(|o| o.merged_over(&global))
                .unwrap_or_else(|| global.clone());
            async move { self.render(&item.code, &options).await }
        }))
        .buffered(cap)
        .collect()
        .await;

        let batch = BatchResult::from_results(results, started.elapsed().as_millis() as u64);
        tracing::info!(
            target: TRACING_TARGET_BATCH,
            total,
            successful = batch.success_count,
            failed = batch.failure_count,
            elapsed_ms = batch.total_elapsed_ms,
            "batch render finished"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use merviz_core::{ConfigHandle, RenderFormat, ServerConfig};

    use super::*;
    use crate::options::DeliveryMode;
    use crate::result::RenderRequest;
    use crate::testing::{FakeBehavior, FakeEngine};

    fn test_renderer(root: &std::path::Path, behavior: FakeBehavior) -> Renderer {
        let config = ConfigHandle::new(ServerConfig {
            output_dir: root.join("output"),
            temp_dir: root.join("temp"),
            ..ServerConfig::default()
        });
        Renderer::with_engine(config, FakeEngine::new(behavior))
    }

    fn svg_request(code: &str) -> RenderRequest {
        RenderRequest {
            code: code.to_owned(),
            options: Some(RenderOptions {
                format: Some(RenderFormat::Svg),
                ..RenderOptions::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_alternating_failures_preserve_order_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = test_renderer(
            dir.path(),
            FakeBehavior::RejectMarker("bad".to_owned(), b"<svg/>".to_vec()),
        );

        let batch = renderer
            .render_batch(BatchRequest {
                requests: vec![
                    svg_request("graph LR\nA-->B"),
                    svg_request("bad"),
                    svg_request("graph TD\nC-->D"),
                    svg_request("also bad"),
                ],
                global_options: None,
            })
            .await;

        assert_eq!(batch.results.len(), 4);
        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.failure_count, 2);
        assert_eq!(batch.success_count + batch.failure_count, batch.results.len());
        // order matches request order: ok, fail, ok, fail
        assert!(batch.results[0].success);
        assert!(!batch.results[1].success);
        assert!(batch.results[2].success);
        assert!(!batch.results[3].success);
        assert!(
            batch.results[1]
                .error
                .as_deref()
                .unwrap()
                .contains("Parse error")
        );
    }

    #[tokio::test]
    async fn test_global_options_merge_item_wins() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = test_renderer(dir.path(), FakeBehavior::WriteBytes(b"<svg/>".to_vec()));

        let batch = renderer
            .render_batch(BatchRequest {
                requests: vec![
                    // inherits the global svg format
                    RenderRequest {
                        code: "graph TD\nA-->B".to_owned(),
                        options: None,
                    },
                    // overrides delivery but keeps the global format
                    RenderRequest {
                        code: "graph TD\nC-->D".to_owned(),
                        options: Some(RenderOptions {
                            delivery: Some(DeliveryMode::None),
                            ..RenderOptions::default()
                        }),
                    },
                ],
                global_options: Some(RenderOptions {
                    format: Some(RenderFormat::Svg),
                    ..RenderOptions::default()
                }),
            })
            .await;

        assert_eq!(batch.success_count, 2);
        assert!(batch.results.iter().all(|r| r.format == "svg"));
    }

    #[tokio::test]
    async fn test_empty_batch_yields_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = test_renderer(dir.path(), FakeBehavior::WriteBytes(b"<svg/>".to_vec()));

        let batch = renderer
            .render_batch(BatchRequest {
                requests: Vec::new(),
                global_options: None,
            })
            .await;

        assert!(batch.results.is_empty());
        assert_eq!(batch.success_count, 0);
        assert_eq!(batch.failure_count, 0);
    }
}
