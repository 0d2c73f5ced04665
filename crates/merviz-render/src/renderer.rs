//! The render orchestrator.
//!
//! A render moves through a fixed sequence: stage input → invoke engine →
//! extract output → install artifact. Staged files are owned by drop
//! guards, so they are removed on every exit path. The caller-visible
//! output path only ever sees a complete artifact: the engine writes into
//! the temp directory and the result is moved into place in one step.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use merviz_core::{ConfigHandle, RenderFormat, ServerConfig};
use tokio::fs;
use tokio::time::{Duration, sleep};
use uuid::Uuid;

use crate::TRACING_TARGET_RENDER;
use crate::engine::{Engine, EngineInvocation, MermaidCli};
use crate::error::{Error, Result};
use crate::options::{RenderOptions, ResolvedOptions};
use crate::raster;
use crate::result::{PixelSize, RenderResult};
use crate::staging::{TempArtifact, install_atomic};

/// Upper bound on attempts for [`Renderer::render_with_retry`].
pub const MAX_RENDER_ATTEMPTS: u32 = 3;

/// A successfully rendered and installed artifact.
#[derive(Debug)]
struct RenderedArtifact {
    path: PathBuf,
    pixel_size: Option<PixelSize>,
    byte_size: u64,
}

/// Orchestrates single renders against the configured engine.
///
/// Cheap to clone; concurrent renders are independent and stage under
/// per-call unique names.
#[derive(Clone)]
pub struct Renderer {
    config: ConfigHandle,
    engine_override: Option<Arc<dyn Engine>>,
}

impl Renderer {
    /// Creates a renderer invoking the configured Mermaid CLI.
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            config,
            engine_override: None,
        }
    }

    /// Creates a renderer with a caller-supplied engine implementation.
    pub fn with_engine(config: ConfigHandle, engine: Arc<dyn Engine>) -> Self {
        Self {
            config,
            engine_override: Some(engine),
        }
    }

    /// Shared configuration handle.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    // The CLI invoker is rebuilt per render from the live configuration so
    // runtime updates to the engine command or timeout take effect.
    fn engine(&self, config: &ServerConfig) -> Arc<dyn Engine> {
        match &self.engine_override {
            Some(engine) => Arc::clone(engine),
            None => Arc::new(MermaidCli::new(&config.engine)),
        }
    }

    /// Renders a single diagram.
    ///
    /// Always returns a result: failures are error-flagged, never raised
    /// past this surface.
    pub async fn render(&self, code: &str, options: &RenderOptions) -> RenderResult {
        let started = Instant::now();
        let format = options.format.unwrap_or_default();

        let outcome = match options.resolve() {
            Ok(resolved) => self.render_inner(code, &resolved).await,
            Err(err) => Err(err),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(artifact) => {
                tracing::info!(
                    target: TRACING_TARGET_RENDER,
                    path = %artifact.path.display(),
                    format = %format,
                    bytes = artifact.byte_size,
                    elapsed_ms,
                    "render completed"
                );
                RenderResult::success(
                    artifact.path,
                    format.as_ref(),
                    artifact.pixel_size,
                    artifact.byte_size,
                    elapsed_ms,
                )
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_RENDER,
                    error = %err,
                    kind = %err.kind().as_ref(),
                    elapsed_ms,
                    "render failed"
                );
                RenderResult::failure(&err, format.as_ref(), elapsed_ms)
            }
        }
    }

    /// Renders with bounded retries for transport-level failures.
    ///
    /// This is caller-level policy layered on [`Renderer::render`]: engine
    /// data errors and invalid input return immediately; startup failures
    /// and timeouts are retried with linear backoff (`attempt × 1s`), up
    /// to [`MAX_RENDER_ATTEMPTS`] attempts.
    pub async fn render_with_retry(
        &self,
        code: &str,
        options: &RenderOptions,
        max_attempts: u32,
    ) -> RenderResult {
        let attempts = max_attempts.clamp(1, MAX_RENDER_ATTEMPTS);
        let mut last = self.render(code, options).await;

        for attempt in 2..=attempts {
            if last.success || !is_retryable_kind(last.error_kind.as_deref()) {
                return last;
            }
            let backoff = Duration::from_secs(u64::from(attempt - 1));
            tracing::info!(
                target: TRACING_TARGET_RENDER,
                attempt,
                backoff = ?backoff,
                "retrying render after transport failure"
            );
            sleep(backoff).await;
            last = self.render(code, options).await;
        }
        last
    }

    /// Removes the staged-file directory.
    ///
    /// Called at shutdown; individual renders clean up after themselves,
    /// this sweeps whatever an aborted process may have left behind.
    pub async fn cleanup(&self) {
        let temp_dir = self.config.snapshot().temp_dir;
        match fs::remove_dir_all(&temp_dir).await {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET_RENDER,
                    path = %temp_dir.display(),
                    "temp directory removed"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET_RENDER,
                    path = %temp_dir.display(),
                    error = %e,
                    "failed to remove temp directory"
                );
            }
        }
    }

    async fn render_inner(&self, code: &str, resolved: &ResolvedOptions) -> Result<RenderedArtifact> {
        if code.trim().is_empty() {
            return Err(Error::EmptySource);
        }

        let config = self.config.snapshot();
        let token = Uuid::new_v4();

        let staged = TempArtifact::stage_input(&config.temp_dir, token, code).await?;
        let raw = TempArtifact::reserve_output(&config.temp_dir, token, resolved.format.extension());

        let engine = self.engine(&config);
        let output = engine
            .invoke(staged.path(), raw.path(), &EngineInvocation::from(resolved))
            .await?;
        if !output.diagnostics.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_RENDER,
                diagnostics = %output.diagnostics,
                "engine diagnostics"
            );
        }

        let metadata = fs::metadata(raw.path())
            .await
            .map_err(|_| Error::Extraction("engine produced no output artifact".to_owned()))?;
        if metadata.len() == 0 {
            return Err(Error::Extraction(
                "engine produced an empty artifact".to_owned(),
            ));
        }

        let pixel_size = self.extract(raw.path(), resolved).await?;

        let destination = match &resolved.output_path {
            Some(path) => path.clone(),
            None => {
                fs::create_dir_all(&config.output_dir).await?;
                config
                    .output_dir
                    .join(format!("mermaid-{token}.{}", resolved.format.extension()))
            }
        };
        install_atomic(raw.path(), &destination).await?;

        let byte_size = fs::metadata(&destination).await?.len();
        Ok(RenderedArtifact {
            path: destination,
            pixel_size,
            byte_size,
        })
    }

    async fn extract(
        &self,
        raw_path: &std::path::Path,
        resolved: &ResolvedOptions,
    ) -> Result<Option<PixelSize>> {
        match resolved.format {
            RenderFormat::Png => {
                // The engine's raster size tracks the diagram bounding box
                // (and the supersampling factor); normalize to the
                // requested viewport.
                let path = raw_path.to_path_buf();
                let (width, height) = (resolved.width, resolved.height);
                let size = tokio::task::spawn_blocking(move || {
                    let actual = raster::measure(&path)?;
                    if actual.width == width && actual.height == height {
                        Ok(actual)
                    } else {
                        raster::downsample_to(&path, width, height)
                    }
                })
                .await
                .map_err(|e| Error::Image(format!("raster worker failed: {e}")))??;
                Ok(Some(size))
            }
            RenderFormat::Svg => {
                let markup = fs::read_to_string(raw_path)
                    .await
                    .map_err(|_| Error::Extraction("rendered markup is unreadable".to_owned()))?;
                if !markup.contains("<svg") {
                    return Err(Error::Extraction(
                        "rendered output has no root svg element".to_owned(),
                    ));
                }
                Ok(None)
            }
            RenderFormat::Pdf => Ok(None),
        }
    }
}

fn is_retryable_kind(kind: Option<&str>) -> bool {
    matches!(kind, Some("engine_startup" | "engine_timeout"))
}
