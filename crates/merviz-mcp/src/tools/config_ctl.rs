//! Configuration access handlers.

use std::sync::Arc;

use merviz_core::{Error, Result, ServerConfigUpdate};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::service::McpService;
use crate::tools::parse_args;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UpdateArgs {
    config: Option<ServerConfigUpdate>,
}

/// Applies a runtime configuration update.
pub fn update(service: &Arc<McpService>, args: Value) -> Result<Value> {
    let args: UpdateArgs = parse_args(args)?;
    let update = args
        .config
        .ok_or_else(|| Error::invalid_input().with_message("missing required parameter: config"))?;

    let config = service.update_config(update)?;
    Ok(json!({
        "success": true,
        "config": config,
    }))
}

/// Reads the current configuration.
pub async fn get(service: &Arc<McpService>) -> Result<Value> {
    Ok(json!({
        "config": service.config().snapshot(),
        "staticServerRunning": service.static_server_running().await,
    }))
}

#[cfg(test)]
mod tests {
    use merviz_core::{ConfigHandle, ServerConfig};

    use super::*;

    fn service(root: &std::path::Path) -> Arc<McpService> {
        McpService::new(ConfigHandle::new(ServerConfig {
            output_dir: root.join("output"),
            temp_dir: root.join("temp"),
            ..ServerConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_update_merges_and_returns_config() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let response = update(
            &service,
            json!({"config": {"serverPort": 8080, "retentionDays": 14}}),
        )
        .unwrap();

        assert_eq!(response["success"], true);
        assert_eq!(response["config"]["serverPort"], 8080);
        assert_eq!(response["config"]["retentionDays"], 14);
        assert_eq!(service.config().snapshot().server_port, 8080);
    }

    #[tokio::test]
    async fn test_update_requires_config_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let err = update(&service, json!({})).unwrap_err();
        assert!(err.to_string().contains("config"));
    }

    #[tokio::test]
    async fn test_get_reports_server_state() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let response = get(&service).await.unwrap();
        assert_eq!(response["staticServerRunning"], false);
        assert_eq!(response["config"]["serverHost"], "localhost");
    }

    #[tokio::test]
    async fn test_invalid_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let err = update(&service, json!({"config": {"serverPort": 0}})).unwrap_err();
        assert!(err.to_string().contains("port"));
        // the live configuration is untouched
        assert_eq!(service.config().snapshot().server_port, 3000);
    }
}
