//! Static server lifecycle: bind, serve, graceful stop.

use std::path::PathBuf;

use merviz_core::ServerConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::routes::{ServeState, router};
use crate::{Error, Result, TRACING_TARGET_SHUTDOWN, TRACING_TARGET_STARTUP};

/// A running static file server.
///
/// Serving happens on a spawned task; [`StaticServer::stop`] cancels it
/// and waits for in-flight connections to drain.
#[derive(Debug)]
pub struct StaticServer {
    base_url: String,
    output_dir: PathBuf,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl StaticServer {
    /// Binds to the configured address and starts serving the output
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns a bind error when the address is unavailable, or an I/O
    /// error when the output directory cannot be created.
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.server_host, config.server_port);
        let base_url = config.base_url();
        let output_dir = config.output_dir.clone();

        tokio::fs::create_dir_all(&output_dir).await?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| Error::Bind {
                addr: addr.clone(),
                source,
            })?;

        let state = ServeState {
            output_dir: output_dir.clone(),
            base_url: base_url.clone(),
        };
        let app = router(state);

        let shutdown = CancellationToken::new();
        let serve_token = shutdown.clone();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { serve_token.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %e,
                    "static server terminated with error"
                );
            }
        });

        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            url = %base_url,
            output_dir = %output_dir.display(),
            "static server listening"
        );

        Ok(Self {
            base_url,
            output_dir,
            shutdown,
            task,
        })
    }

    /// Public base URL of this server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Directory this server exposes under `/files`.
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Request URL for an artifact under the served directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact lies outside the served tree.
    pub fn file_url(&self, artifact: &std::path::Path) -> Result<String> {
        crate::url::file_url(&self.base_url, &self.output_dir, artifact)
    }

    /// Stops the server gracefully.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %e,
                "static server task did not shut down cleanly"
            );
        } else {
            tracing::info!(target: TRACING_TARGET_SHUTDOWN, "static server stopped");
        }
    }
}
