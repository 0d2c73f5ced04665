//! JSON-RPC 2.0 wire types and response constructors.
//!
//! The minimal surface needed for a line-delimited JSON-RPC server over
//! stdio: incoming message deserialization, outgoing response
//! serialization and the standard error codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard JSON-RPC parse error code.
pub const CODE_PARSE_ERROR: i64 = -32700;

/// Standard JSON-RPC invalid request code.
pub const CODE_INVALID_REQUEST: i64 = -32600;

/// Standard JSON-RPC method-not-found code.
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// Standard JSON-RPC invalid params code.
pub const CODE_INVALID_PARAMS: i64 = -32602;

/// An incoming JSON-RPC 2.0 message.
///
/// Requests carry an id; notifications do not and are never answered.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

impl IncomingMessage {
    /// Whether this message is a notification (no response expected).
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// An outgoing JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Builds a success response.
pub fn success(id: Value, result: Value) -> Response {
    Response {
        jsonrpc: "2.0",
        result: Some(result),
        error: None,
        id,
    }
}

/// Builds an error response with the given code and message.
pub fn error(id: Value, code: i64, message: impl Into<String>) -> Response {
    Response {
        jsonrpc: "2.0",
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data: None,
        }),
        id,
    }
}

/// Builds a method-not-found response.
pub fn method_not_found(id: Value, method: &str) -> Response {
    error(id, CODE_METHOD_NOT_FOUND, format!("Method not found: {method}"))
}

/// Builds a parse-error response with a null id.
pub fn parse_error() -> Response {
    error(Value::Null, CODE_PARSE_ERROR, "Parse error")
}
