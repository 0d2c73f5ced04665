//! Process-wide server configuration.
//!
//! Configuration is an explicit object rather than ambient global state:
//! it is constructed once at startup, handed to each component, and
//! mutated at runtime only through [`ConfigHandle::apply`], the single
//! narrow update entry point.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{Error, Result};
use crate::retention::DEFAULT_RETENTION_DAYS;

/// Environment variable holding the credential for the default
/// image-hosting backend.
pub const IMGUR_CLIENT_ID_ENV: &str = "IMGUR_CLIENT_ID";

/// Rendering engine invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Engine executable invoked for each render.
    pub command: String,
    /// Completion bound for a single invocation, in seconds.
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "mmdc".to_owned(),
            timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Completion bound as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Object-storage delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinioSettings {
    /// Storage endpoint URL, including scheme and optional port.
    pub endpoint: String,
    /// Access key for authentication.
    pub access_key: String,
    /// Secret key for authentication; never serialized back to callers.
    #[serde(skip_serializing)]
    pub secret_key: String,
    /// Bucket that receives uploaded artifacts.
    pub bucket: String,
    /// Storage region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Base URL for public object access when it differs from the
    /// endpoint (e.g. behind a reverse proxy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

/// Supported image-hosting backends.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HostingProvider {
    /// imgur.com anonymous image upload.
    #[default]
    Imgur,
    /// sm.ms image upload.
    SmMs,
    /// Caller-supplied upload endpoint.
    Custom,
}

/// Image-hosting REST delivery settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostingSettings {
    /// Selected backend.
    #[serde(default)]
    pub provider: HostingProvider,
    /// API key or client id for the backend, when it requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Upload URL for the custom backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    /// Extra request headers for the custom backend.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl HostingSettings {
    /// Builds the default imgur settings from the process environment.
    ///
    /// Returns `None` when no credential is present.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(IMGUR_CLIENT_ID_ENV).ok()?;
        if api_key.is_empty() {
            return None;
        }
        Some(Self {
            provider: HostingProvider::Imgur,
            api_key: Some(api_key),
            upload_url: None,
            headers: HashMap::new(),
        })
    }
}

/// Process-wide server configuration.
///
/// Initialized from defaults (optionally overridden by CLI/environment),
/// read by all components, updated at runtime only through
/// [`ConfigHandle::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Static file server host.
    pub server_host: String,
    /// Static file server port.
    pub server_port: u16,
    /// Directory receiving rendered artifacts.
    pub output_dir: PathBuf,
    /// Directory for short-lived staged inputs and outputs.
    pub temp_dir: PathBuf,
    /// Upper bound on concurrently running engine invocations.
    pub max_concurrent_renders: usize,
    /// Rendering engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Default retention window for uploaded artifacts, in days.
    pub retention_days: i64,
    /// Object-storage delivery settings, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minio: Option<MinioSettings>,
    /// Image-hosting delivery settings, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosting: Option<HostingSettings>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_host: "localhost".to_owned(),
            server_port: 3000,
            output_dir: PathBuf::from("./merviz-output"),
            temp_dir: std::env::temp_dir().join("merviz"),
            max_concurrent_renders: 2,
            engine: EngineConfig::default(),
            retention_days: DEFAULT_RETENTION_DAYS,
            minio: None,
            hosting: HostingSettings::from_env(),
        }
    }
}

impl ServerConfig {
    /// Base URL of the static file server.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(Error::configuration().with_message("server port must be non-zero"));
        }
        if self.max_concurrent_renders == 0 {
            return Err(
                Error::configuration().with_message("max concurrent renders must be at least 1")
            );
        }
        if self.engine.command.is_empty() {
            return Err(Error::configuration().with_message("engine command must not be empty"));
        }
        if self.engine.timeout_secs == 0 {
            return Err(Error::configuration().with_message("engine timeout must be non-zero"));
        }
        if let Some(hosting) = &self.hosting
            && hosting.provider == HostingProvider::Custom
            && hosting.upload_url.is_none()
        {
            return Err(
                Error::configuration().with_message("custom image hosting requires an upload URL")
            );
        }
        Ok(())
    }

    /// Applies a partial update, field by field.
    pub fn merge(&mut self, update: ServerConfigUpdate) {
        if let Some(server_host) = update.server_host {
            self.server_host = server_host;
        }
        if let Some(server_port) = update.server_port {
            self.server_port = server_port;
        }
        if let Some(output_dir) = update.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(temp_dir) = update.temp_dir {
            self.temp_dir = temp_dir;
        }
        if let Some(max_concurrent_renders) = update.max_concurrent_renders {
            self.max_concurrent_renders = max_concurrent_renders;
        }
        if let Some(command) = update.engine_command {
            self.engine.command = command;
        }
        if let Some(timeout_secs) = update.engine_timeout_secs {
            self.engine.timeout_secs = timeout_secs;
        }
        if let Some(retention_days) = update.retention_days {
            self.retention_days = retention_days;
        }
        if let Some(minio) = update.minio {
            self.minio = Some(minio);
        }
        if let Some(hosting) = update.hosting {
            self.hosting = Some(hosting);
        }
    }
}

/// Partial mirror of [`ServerConfig`] for runtime updates.
///
/// Absent fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigUpdate {
    /// New static server host.
    pub server_host: Option<String>,
    /// New static server port.
    pub server_port: Option<u16>,
    /// New artifact output directory.
    pub output_dir: Option<PathBuf>,
    /// New temp directory.
    pub temp_dir: Option<PathBuf>,
    /// New concurrency cap for engine invocations.
    pub max_concurrent_renders: Option<usize>,
    /// New engine executable.
    pub engine_command: Option<String>,
    /// New engine completion bound, in seconds.
    pub engine_timeout_secs: Option<u64>,
    /// New default retention window, in days.
    pub retention_days: Option<i64>,
    /// Replacement object-storage settings.
    pub minio: Option<MinioSettings>,
    /// Replacement image-hosting settings.
    pub hosting: Option<HostingSettings>,
}

/// Shared handle to the live [`ServerConfig`].
///
/// Cloning the handle shares the same underlying configuration. Reads take
/// a snapshot; writes go through [`ConfigHandle::apply`], which validates
/// the merged result before committing it.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<ServerConfig>>,
}

impl ConfigHandle {
    /// Wraps an initial configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Returns a snapshot of the current configuration.
    pub fn snapshot(&self) -> ServerConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merges a partial update into the live configuration.
    ///
    /// The update is applied to a copy first and committed only when the
    /// merged result validates, so a bad update never leaves the live
    /// configuration half-modified.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the merged result is invalid.
    pub fn apply(&self, update: ServerConfigUpdate) -> Result<ServerConfig> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut merged = guard.clone();
        merged.merge(update);
        merged.validate()?;
        *guard = merged.clone();
        tracing::info!(target: "merviz_core::config", "configuration updated");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server_host, "localhost");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.max_concurrent_renders, 2);
        assert_eq!(config.engine.command, "mmdc");
        assert_eq!(config.engine.timeout_secs, 60);
        assert_eq!(config.retention_days, DEFAULT_RETENTION_DAYS);
        assert_eq!(config.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let config = ServerConfig {
            server_port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_custom_hosting_without_url() {
        let config = ServerConfig {
            hosting: Some(HostingSettings {
                provider: HostingProvider::Custom,
                ..HostingSettings::default()
            }),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_item_fields_win() {
        let mut config = ServerConfig::default();
        config.merge(ServerConfigUpdate {
            server_port: Some(8080),
            engine_timeout_secs: Some(90),
            ..ServerConfigUpdate::default()
        });
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.engine.timeout_secs, 90);
        // untouched fields keep their values
        assert_eq!(config.server_host, "localhost");
    }

    #[test]
    fn test_handle_apply_commits_valid_update() {
        let handle = ConfigHandle::new(ServerConfig::default());
        let updated = handle
            .apply(ServerConfigUpdate {
                server_host: Some("0.0.0.0".to_owned()),
                ..ServerConfigUpdate::default()
            })
            .unwrap();
        assert_eq!(updated.server_host, "0.0.0.0");
        assert_eq!(handle.snapshot().server_host, "0.0.0.0");
    }

    #[test]
    fn test_handle_apply_rejects_invalid_update_without_committing() {
        let handle = ConfigHandle::new(ServerConfig::default());
        let result = handle.apply(ServerConfigUpdate {
            server_port: Some(0),
            ..ServerConfigUpdate::default()
        });
        assert!(result.is_err());
        assert_eq!(handle.snapshot().server_port, 3000);
    }
}
