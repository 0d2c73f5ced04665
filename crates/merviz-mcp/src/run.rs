//! The stdio serving loop.
//!
//! Messages arrive one JSON-RPC request per line on stdin; responses go
//! out one per line on stdout. Tool failures are converted into
//! error-flagged payloads, never into broken connections: the loop only
//! ends on stdin EOF or a shutdown signal.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::jsonrpc::{
    CODE_INVALID_PARAMS, CODE_INVALID_REQUEST, IncomingMessage, Response, error, method_not_found,
    parse_error, success,
};
use crate::service::McpService;
use crate::{SERVER_NAME, SERVER_VERSION, TRACING_TARGET_RPC, tools};

/// Protocol revision reported in the initialize handshake.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Serves JSON-RPC over stdio until EOF or shutdown.
///
/// # Errors
///
/// Returns an I/O error when stdin or stdout fail; protocol-level
/// problems are answered on the wire instead.
pub async fn run_stdio(
    service: Arc<McpService>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    tracing::info!(
        target: TRACING_TARGET_RPC,
        version = SERVER_VERSION,
        "serving tools over stdio"
    );

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!(target: TRACING_TARGET_RPC, "shutdown requested, leaving serve loop");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    None => {
                        tracing::info!(target: TRACING_TARGET_RPC, "stdin closed, leaving serve loop");
                        break;
                    }
                    Some(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if let Some(response) = handle_line(&service, line).await {
                            let serialized = serde_json::to_string(&response)?;
                            stdout.write_all(serialized.as_bytes()).await?;
                            stdout.write_all(b"\n").await?;
                            stdout.flush().await?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Handles one request line; `None` means no response goes out
/// (notifications).
async fn handle_line(service: &Arc<McpService>, line: &str) -> Option<Response> {
    let message: IncomingMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(target: TRACING_TARGET_RPC, error = %e, "unparseable request line");
            return Some(parse_error());
        }
    };

    if message.is_notification() {
        tracing::debug!(
            target: TRACING_TARGET_RPC,
            method = message.method.as_deref().unwrap_or("<none>"),
            "ignoring notification"
        );
        return None;
    }
    let id = message.id.unwrap_or(Value::Null);

    match message.method.as_deref() {
        Some("initialize") => Some(success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION,
                },
            }),
        )),
        Some("ping") => Some(success(id, json!({}))),
        Some("tools/list") => Some(success(id, json!({ "tools": tools::tool_declarations() }))),
        Some("tools/call") => Some(handle_tool_call(service, id, message.params).await),
        Some(other) => Some(method_not_found(id, other)),
        None => Some(error(id, CODE_INVALID_REQUEST, "missing method")),
    }
}

async fn handle_tool_call(service: &Arc<McpService>, id: Value, params: Option<Value>) -> Response {
    let params = params.unwrap_or(Value::Null);
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return error(id, CODE_INVALID_PARAMS, "missing tool name");
    };
    let args = params.get("arguments").cloned().unwrap_or(Value::Null);

    tracing::info!(target: TRACING_TARGET_RPC, tool = %name, "tool call");

    match tools::dispatch(service, name, args).await {
        Ok(payload) => {
            let text =
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
            success(
                id,
                json!({ "content": [{ "type": "text", "text": text }] }),
            )
        }
        Err(e) => {
            tracing::warn!(target: TRACING_TARGET_RPC, tool = %name, error = %e, "tool call failed");
            success(
                id,
                json!({
                    "content": [{ "type": "text", "text": format!("Error: {e}") }],
                    "isError": true,
                }),
            )
        }
    }
}
