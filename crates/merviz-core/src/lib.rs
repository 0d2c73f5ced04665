#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod format;
pub mod retention;

pub use crate::config::{
    ConfigHandle, EngineConfig, HostingProvider, HostingSettings, MinioSettings, ServerConfig,
    ServerConfigUpdate,
};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::format::{DiagramTheme, RenderFormat, content_type_for_extension};
pub use crate::retention::{DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS, clamp_retention_days};
