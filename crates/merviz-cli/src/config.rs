//! CLI configuration.
//!
//! All settings can be provided as flags or environment variables; the
//! parsed arguments collapse into the process-wide [`ServerConfig`] that
//! every component reads through the shared handle.

use std::path::PathBuf;

use clap::Parser;
use merviz_core::{EngineConfig, HostingSettings, MinioSettings, ServerConfig};

/// merviz — Mermaid diagram rendering over JSON-RPC tools.
#[derive(Debug, Clone, Parser)]
#[command(name = "merviz")]
#[command(about = "Mermaid diagram rendering server with static and object-storage delivery")]
#[command(version)]
pub struct Cli {
    /// Static file server host.
    #[arg(long, env = "MERVIZ_HOST", default_value = "localhost")]
    pub host: String,

    /// Static file server port.
    #[arg(long, env = "MERVIZ_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory receiving rendered artifacts.
    #[arg(long, env = "MERVIZ_OUTPUT_DIR", default_value = "./merviz-output")]
    pub output_dir: PathBuf,

    /// Directory for staged temp files; defaults to the system temp dir.
    #[arg(long, env = "MERVIZ_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Upper bound on concurrently running engine invocations.
    #[arg(long, env = "MERVIZ_MAX_CONCURRENT_RENDERS", default_value_t = 2)]
    pub max_concurrent_renders: usize,

    /// Rendering engine executable.
    #[arg(long, env = "MERVIZ_ENGINE_COMMAND", default_value = "mmdc")]
    pub engine_command: String,

    /// Engine completion bound in seconds.
    #[arg(long, env = "MERVIZ_ENGINE_TIMEOUT_SECS", default_value_t = 60)]
    pub engine_timeout_secs: u64,

    /// Default retention window for uploads, in days (clamped to 1-30).
    #[arg(long, env = "MERVIZ_RETENTION_DAYS", default_value_t = 7)]
    pub retention_days: i64,

    /// Object-storage endpoint URL; uploads are disabled when absent.
    #[arg(long, env = "MINIO_ENDPOINT")]
    pub minio_endpoint: Option<String>,

    /// Object-storage access key.
    #[arg(long, env = "MINIO_ACCESS_KEY")]
    pub minio_access_key: Option<String>,

    /// Object-storage secret key.
    #[arg(long, env = "MINIO_SECRET_KEY")]
    pub minio_secret_key: Option<String>,

    /// Bucket receiving uploaded artifacts.
    #[arg(long, env = "MINIO_BUCKET", default_value = "mermaid-charts")]
    pub minio_bucket: String,

    /// Object-storage region.
    #[arg(long, env = "MINIO_REGION")]
    pub minio_region: Option<String>,

    /// Public base URL for uploaded objects (reverse-proxy setups).
    #[arg(long, env = "MINIO_PUBLIC_URL")]
    pub minio_public_url: Option<String>,
}

impl Cli {
    /// Collapses parsed arguments into the process-wide configuration.
    pub fn into_server_config(self) -> ServerConfig {
        let minio = match (
            self.minio_endpoint,
            self.minio_access_key,
            self.minio_secret_key,
        ) {
            (Some(endpoint), Some(access_key), Some(secret_key)) => Some(MinioSettings {
                endpoint,
                access_key,
                secret_key,
                bucket: self.minio_bucket,
                region: self.minio_region,
                public_base_url: self.minio_public_url,
            }),
            _ => None,
        };

        ServerConfig {
            server_host: self.host,
            server_port: self.port,
            output_dir: self.output_dir,
            temp_dir: self
                .temp_dir
                .unwrap_or_else(|| std::env::temp_dir().join("merviz")),
            max_concurrent_renders: self.max_concurrent_renders,
            engine: EngineConfig {
                command: self.engine_command,
                timeout_secs: self.engine_timeout_secs,
            },
            retention_days: self.retention_days,
            minio,
            hosting: HostingSettings::from_env(),
        }
    }
}
