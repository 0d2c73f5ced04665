//! Static server control handlers.

use std::sync::Arc;

use merviz_core::Result;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::service::McpService;
use crate::tools::parse_args;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StartArgs {
    port: Option<u16>,
    host: Option<String>,
}

/// Starts the static server, applying host/port overrides first.
pub async fn start(service: &Arc<McpService>, args: Value) -> Result<Value> {
    let args: StartArgs = parse_args(args)?;
    let base_url = service.start_static_server(args.host, args.port).await?;
    Ok(json!({
        "success": true,
        "baseUrl": base_url,
        "config": service.config().snapshot(),
    }))
}

/// Stops the static server when it is running.
pub async fn stop(service: &Arc<McpService>) -> Result<Value> {
    let was_running = service.stop_static_server().await;
    Ok(json!({
        "success": true,
        "wasRunning": was_running,
    }))
}

#[cfg(test)]
mod tests {
    use merviz_core::{ConfigHandle, ServerConfig};

    use super::*;

    fn service(root: &std::path::Path) -> Arc<McpService> {
        McpService::new(ConfigHandle::new(ServerConfig {
            server_port: 0,
            output_dir: root.join("output"),
            temp_dir: root.join("temp"),
            ..ServerConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_start_and_stop_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let started = start(&service, Value::Null).await.unwrap();
        assert_eq!(started["success"], true);
        assert!(started["baseUrl"].as_str().unwrap().starts_with("http://"));
        assert!(service.static_server_running().await);

        let stopped = stop(&service).await.unwrap();
        assert_eq!(stopped["wasRunning"], true);
        assert!(!service.static_server_running().await);
    }

    #[tokio::test]
    async fn test_stop_without_running_server() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let stopped = stop(&service).await.unwrap();
        assert_eq!(stopped["success"], true);
        assert_eq!(stopped["wasRunning"], false);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_port_update() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        // port 0 fails configuration validation on update
        let result = start(&service, json!({"port": 0})).await;
        assert!(result.is_err());
    }
}
