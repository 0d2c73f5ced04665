//! Router and handlers for the static file server.

use std::path::PathBuf;

use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get};
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::url::is_safe_file_name;
use crate::{TRACING_TARGET_FILES, file_url};

/// Extensions exposed by the artifact listing.
const ARTIFACT_EXTENSIONS: [&str; 3] = ["png", "svg", "pdf"];

/// Shared state for the file API handlers.
///
/// Captured at server start; a configuration change takes effect on the
/// next server start, matching the lifetime of the `ServeDir` mount.
#[derive(Debug, Clone)]
pub struct ServeState {
    /// Directory being served.
    pub output_dir: PathBuf,
    /// Public base URL of this server.
    pub base_url: String,
}

/// Builds the router: static files, artifact API and health check.
pub fn router(state: ServeState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/files", get(list_files))
        .route("/api/files/{filename}", delete(delete_file))
        .nest_service("/files", ServeDir::new(state.output_dir.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({ "status": "ok", "timestamp": timestamp }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    name: String,
    url: String,
    path: PathBuf,
}

async fn list_files(
    State(state): State<ServeState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut entries = match tokio::fs::read_dir(&state.output_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("cannot read output directory: {e}") })),
            ));
        }
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_artifact = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ARTIFACT_EXTENSIONS.contains(&e));
        if !is_artifact {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Ok(url) = file_url(&state.base_url, &state.output_dir, &path) {
            files.push(FileEntry { name, url, path });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(json!({ "files": files })))
}

async fn delete_file(
    State(state): State<ServeState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !is_safe_file_name(&filename) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid file name" })),
        ));
    }

    let path = state.output_dir.join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET_FILES,
                file = %filename,
                "artifact deleted"
            );
            Ok(Json(json!({ "success": true })))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "file not found" })),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("failed to delete file: {e}") })),
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    fn test_state(output_dir: PathBuf) -> ServeState {
        ServeState {
            output_dir,
            base_url: "http://localhost:3000".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_health_responds_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path().to_path_buf()));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_file_is_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chart.svg"), "<svg/>").unwrap();
        let app = router(test_state(dir.path().to_path_buf()));

        let response = app
            .oneshot(Request::get("/files/chart.svg").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_files_responds_ok() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        let app = router(test_state(dir.path().to_path_buf()));

        let response = app
            .oneshot(Request::get("/api/files").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path().to_path_buf()));

        let response = app
            .oneshot(
                Request::delete("/api/files/..%2Fescape.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("old.png");
        std::fs::write(&artifact, b"png").unwrap();
        let app = router(test_state(dir.path().to_path_buf()));

        let response = app
            .oneshot(
                Request::delete("/api/files/old.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path().to_path_buf()));

        let response = app
            .oneshot(
                Request::delete("/api/files/ghost.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
