#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_RPC: &str = "merviz_mcp::rpc";
pub const TRACING_TARGET_TOOLS: &str = "merviz_mcp::tools";
pub const TRACING_TARGET_DELIVERY: &str = "merviz_mcp::delivery";

pub mod delivery;
pub mod jsonrpc;
pub mod run;
pub mod service;
pub mod tools;

pub use crate::run::run_stdio;
pub use crate::service::McpService;

/// Name reported in the initialize handshake.
pub const SERVER_NAME: &str = "merviz";

/// Version reported in the initialize handshake.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
