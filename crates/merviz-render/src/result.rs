//! Request and result types for single and batch renders.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::options::RenderOptions;

/// Pixel dimensions of a raster artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A single render request: diagram source plus options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Diagram source text.
    pub code: String,
    /// Per-request render options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RenderOptions>,
}

/// Outcome of a single render, produced exactly once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// Whether the render itself succeeded.
    pub success: bool,
    /// Path of the rendered artifact, when the render succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
    /// Public URL of the artifact, when delivery succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_url: Option<String>,
    /// Human-readable render failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable category of the render failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Delivery failure message; independent of render success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_error: Option<String>,
    /// Output format of the artifact.
    pub format: String,
    /// Pixel dimensions for raster artifacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<PixelSize>,
    /// Wall-clock render duration in milliseconds.
    pub elapsed_ms: u64,
    /// Size of the artifact in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
}

impl RenderResult {
    /// Builds a success result for a rendered artifact.
    pub fn success(
        artifact_path: PathBuf,
        format: impl Into<String>,
        pixel_size: Option<PixelSize>,
        byte_size: u64,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            success: true,
            artifact_path: Some(artifact_path),
            online_url: None,
            error: None,
            error_kind: None,
            delivery_error: None,
            format: format.into(),
            pixel_size,
            elapsed_ms,
            byte_size: Some(byte_size),
        }
    }

    /// Builds a failure result carrying the pipeline error.
    pub fn failure(error: &Error, format: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            artifact_path: None,
            online_url: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().as_ref().to_owned()),
            delivery_error: None,
            format: format.into(),
            pixel_size: None,
            elapsed_ms,
            byte_size: None,
        }
    }
}

/// An ordered batch of render requests with optional shared options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Requests in caller order.
    pub requests: Vec<RenderRequest>,
    /// Options merged underneath each item's own options; item keys win.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_options: Option<RenderOptions>,
}

/// Aggregate outcome of a batch render.
///
/// `results` preserves request order; `success_count + failure_count`
/// always equals `results.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Per-item results in request order.
    pub results: Vec<RenderResult>,
    /// Number of successful renders.
    pub success_count: usize,
    /// Number of failed renders.
    pub failure_count: usize,
    /// Wall-clock duration of the whole batch in milliseconds.
    pub total_elapsed_ms: u64,
}

impl BatchResult {
    /// Aggregates per-item results into a batch summary.
    pub fn from_results(results: Vec<RenderResult>, total_elapsed_ms: u64) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        Self {
            results,
            success_count,
            failure_count,
            total_elapsed_ms,
        }
    }
}
