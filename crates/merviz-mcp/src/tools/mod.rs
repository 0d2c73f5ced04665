//! Tool declarations and dispatch.
//!
//! Every recognized tool is declared with its JSON schema for
//! `tools/list` and dispatched by name for `tools/call`. Handler errors
//! never escape the dispatch boundary as exceptions; the rpc layer turns
//! them into error-flagged payloads.

pub mod config_ctl;
pub mod maintenance;
pub mod render;
pub mod server_ctl;

use std::sync::Arc;

use merviz_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::service::McpService;

/// Declarations for every recognized tool, in `tools/list` shape.
pub fn tool_declarations() -> Value {
    json!([
        {
            "name": "render_mermaid",
            "description": "Render a single Mermaid diagram to an image",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "Mermaid diagram source"
                    },
                    "options": {
                        "type": "object",
                        "description": "Render options",
                        "properties": {
                            "format": {
                                "type": "string",
                                "enum": ["png", "svg", "pdf"],
                                "description": "Output format",
                                "default": "png"
                            },
                            "outputPath": {
                                "type": "string",
                                "description": "Explicit destination path (optional)"
                            },
                            "width": {
                                "type": "number",
                                "description": "Image width in pixels",
                                "default": 1200
                            },
                            "height": {
                                "type": "number",
                                "description": "Image height in pixels",
                                "default": 800
                            },
                            "backgroundColor": {
                                "type": "string",
                                "description": "Background color",
                                "default": "white"
                            },
                            "theme": {
                                "type": "string",
                                "enum": ["default", "dark", "forest", "neutral"],
                                "description": "Diagram theme",
                                "default": "default"
                            },
                            "scale": {
                                "type": "number",
                                "description": "Supersampling factor for raster output",
                                "default": 2.0
                            },
                            "delivery": {
                                "type": "string",
                                "enum": ["none", "local-server", "remote-upload"],
                                "description": "How to expose the rendered artifact",
                                "default": "none"
                            },
                            "generateOnlineLink": {
                                "type": "boolean",
                                "description": "Legacy flag equivalent to delivery: local-server",
                                "default": false
                            },
                            "retentionDays": {
                                "type": "number",
                                "description": "Retention window for uploads in days (clamped to 1-30)",
                                "default": 7
                            }
                        }
                    }
                },
                "required": ["code"]
            }
        },
        {
            "name": "batch_render_mermaid",
            "description": "Render multiple Mermaid diagrams in one call",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "requests": {
                        "type": "array",
                        "description": "Render requests in order",
                        "items": {
                            "type": "object",
                            "properties": {
                                "code": {
                                    "type": "string",
                                    "description": "Mermaid diagram source"
                                },
                                "options": {
                                    "type": "object",
                                    "description": "Per-request render options"
                                }
                            },
                            "required": ["code"]
                        }
                    },
                    "globalOptions": {
                        "type": "object",
                        "description": "Options merged underneath each request's own options"
                    }
                },
                "required": ["requests"]
            }
        },
        {
            "name": "start_static_server",
            "description": "Start the static file server for rendered artifacts",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "port": {
                        "type": "number",
                        "description": "Server port"
                    },
                    "host": {
                        "type": "string",
                        "description": "Server host"
                    }
                }
            }
        },
        {
            "name": "stop_static_server",
            "description": "Stop the static file server",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        },
        {
            "name": "update_config",
            "description": "Update the server configuration at runtime",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "config": {
                        "type": "object",
                        "description": "Partial configuration update"
                    }
                },
                "required": ["config"]
            }
        },
        {
            "name": "get_config",
            "description": "Read the current server configuration",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        },
        {
            "name": "cleanup_expired_uploads",
            "description": "Delete uploaded artifacts whose retention window has passed",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        }
    ])
}

/// Dispatches one tool call by name.
///
/// # Errors
///
/// Returns an invalid-input error for unknown tools or malformed
/// arguments, and the handler's own error otherwise.
pub async fn dispatch(service: &Arc<McpService>, name: &str, args: Value) -> Result<Value> {
    match name {
        "render_mermaid" => render::render_mermaid(service, args).await,
        "batch_render_mermaid" => render::batch_render_mermaid(service, args).await,
        "start_static_server" => server_ctl::start(service, args).await,
        "stop_static_server" => server_ctl::stop(service).await,
        "update_config" => config_ctl::update(service, args),
        "get_config" => config_ctl::get(service).await,
        "cleanup_expired_uploads" => maintenance::cleanup_expired_uploads(service).await,
        _ => Err(Error::invalid_input().with_message(format!("unknown tool: {name}"))),
    }
}

/// Deserializes tool arguments, treating absent arguments as defaults.
pub(crate) fn parse_args<T>(args: Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args)
        .map_err(|e| Error::invalid_input().with_message(format!("invalid arguments: {e}")))
}

/// Serializes a handler result into a JSON payload.
pub(crate) fn to_payload<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        Error::new(merviz_core::ErrorKind::Unknown)
            .with_message(format!("failed to serialize result: {e}"))
    })
}
