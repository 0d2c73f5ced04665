#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_ENGINE: &str = "merviz_render::engine";
pub const TRACING_TARGET_RENDER: &str = "merviz_render::render";
pub const TRACING_TARGET_BATCH: &str = "merviz_render::batch";

pub mod batch;
pub mod engine;
#[cfg(test)]
pub(crate) mod testing;
pub mod error;
pub mod options;
pub mod raster;
pub mod renderer;
pub mod result;
pub mod staging;

pub use crate::engine::{Engine, EngineInvocation, EngineOutput, MermaidCli};
pub use crate::error::{Error, Result};
pub use crate::options::{DeliveryMode, RenderOptions, ResolvedOptions};
pub use crate::renderer::Renderer;
pub use crate::result::{BatchRequest, BatchResult, PixelSize, RenderRequest, RenderResult};
pub use crate::staging::TempArtifact;
