//! Shared service state behind the tool surface.

use std::sync::Arc;

use merviz_core::{ConfigHandle, Error, Result, ServerConfig, ServerConfigUpdate};
use merviz_render::Renderer;
use merviz_server::StaticServer;
use tokio::sync::Mutex;

use crate::TRACING_TARGET_TOOLS;

/// State shared by every tool handler: the live configuration, the render
/// orchestrator and the (optional) running static server.
pub struct McpService {
    config: ConfigHandle,
    renderer: Renderer,
    static_server: Mutex<Option<StaticServer>>,
}

impl McpService {
    /// Creates the service around an initial configuration.
    pub fn new(config: ConfigHandle) -> Arc<Self> {
        let renderer = Renderer::new(config.clone());
        Arc::new(Self {
            config,
            renderer,
            static_server: Mutex::new(None),
        })
    }

    /// Creates the service with a caller-supplied renderer (tests).
    pub fn with_renderer(config: ConfigHandle, renderer: Renderer) -> Arc<Self> {
        Arc::new(Self {
            config,
            renderer,
            static_server: Mutex::new(None),
        })
    }

    /// Live configuration handle.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// The render orchestrator.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Whether the static server is currently running.
    pub async fn static_server_running(&self) -> bool {
        self.static_server.lock().await.is_some()
    }

    /// Ensures the static server is running and returns its base URL.
    ///
    /// # Errors
    ///
    /// Returns a delivery error when the server cannot be started.
    pub async fn ensure_static_server(&self) -> Result<String> {
        let mut guard = self.static_server.lock().await;
        if let Some(server) = guard.as_ref() {
            return Ok(server.base_url().to_owned());
        }

        let server = StaticServer::start(&self.config.snapshot())
            .await
            .map_err(|e| {
                Error::delivery()
                    .with_message(format!("static server could not be started: {e}"))
                    .with_source(e)
            })?;
        let base_url = server.base_url().to_owned();
        *guard = Some(server);
        Ok(base_url)
    }

    /// Starts (or restarts) the static server, applying optional host and
    /// port overrides to the configuration first.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration update is invalid or the
    /// server cannot bind.
    pub async fn start_static_server(
        &self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<String> {
        if host.is_some() || port.is_some() {
            self.config.apply(ServerConfigUpdate {
                server_host: host,
                server_port: port,
                ..ServerConfigUpdate::default()
            })?;
        }

        // a running server holds the previous address; restart it so the
        // reported base URL matches the configuration
        let mut guard = self.static_server.lock().await;
        if let Some(server) = guard.take() {
            tracing::info!(
                target: TRACING_TARGET_TOOLS,
                "restarting static server with updated configuration"
            );
            server.stop().await;
        }

        let server = StaticServer::start(&self.config.snapshot())
            .await
            .map_err(|e| {
                Error::delivery()
                    .with_message(format!("static server could not be started: {e}"))
                    .with_source(e)
            })?;
        let base_url = server.base_url().to_owned();
        *guard = Some(server);
        Ok(base_url)
    }

    /// Stops the static server when it is running.
    ///
    /// Returns whether a server was actually stopped.
    pub async fn stop_static_server(&self) -> bool {
        let mut guard = self.static_server.lock().await;
        match guard.take() {
            Some(server) => {
                server.stop().await;
                true
            }
            None => false,
        }
    }

    /// Computes the serving URL for an artifact via the running server.
    ///
    /// # Errors
    ///
    /// Returns a delivery error when the server is not running or the
    /// artifact lies outside the served directory.
    pub async fn served_file_url(&self, artifact: &std::path::Path) -> Result<String> {
        let guard = self.static_server.lock().await;
        let server = guard
            .as_ref()
            .ok_or_else(|| Error::delivery().with_message("static server is not running"))?;
        server.file_url(artifact).map_err(|e| {
            Error::delivery()
                .with_message(format!("artifact cannot be served: {e}"))
                .with_source(e)
        })
    }

    /// Applies a runtime configuration update.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the merged result is invalid.
    pub fn update_config(&self, update: ServerConfigUpdate) -> Result<ServerConfig> {
        self.config.apply(update)
    }

    /// Graceful shutdown: stop serving and sweep staged files.
    pub async fn shutdown(&self) {
        self.stop_static_server().await;
        self.renderer.cleanup().await;
    }
}
