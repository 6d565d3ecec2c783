//! JSON-RPC 2.0 subset envelope and request dispatch.
//!
//! One POST, one response. The HTTP status of a reachable, authorized
//! request is always 200; failure travels in the JSON-RPC `error` member.
//! No batching, no notifications.

use crate::FsServer;
use crate::tools::{self, ToolError};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// The request envelope was not a valid JSON-RPC 2.0 message.
pub const INVALID_REQUEST: i64 = -32600;
/// The method or tool name is not known.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Tool execution failed.
pub const SERVER_ERROR: i64 = -32000;

/// Incoming JSON-RPC request envelope.
///
/// Fields default rather than reject so that a malformed envelope still
/// produces a JSON-RPC error response instead of an HTTP-level failure.
#[derive(Debug, Default, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Outgoing JSON-RPC response envelope. Exactly one of `result` / `error`
/// is serialized.
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// JSON-RPC error member.
#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
        }
    }
}

/// The payload of a `tools/call` request.
#[derive(Debug, Default, Deserialize)]
pub struct ToolInvocation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Axum handler for the JSON-RPC endpoint (`/` and `/mcp`).
pub async fn handle(State(server): State<Arc<FsServer>>, Json(body): Json<Value>) -> Json<Response> {
    debug!(message = %body, "client request");
    let request: Request = serde_json::from_value(body).unwrap_or_default();
    let response = dispatch(&server, request).await;
    if let Ok(encoded) = serde_json::to_string(&response) {
        debug!(message = %encoded, "server response");
    }
    Json(response)
}

/// Route a request by protocol version and method.
pub async fn dispatch(server: &FsServer, request: Request) -> Response {
    if request.jsonrpc != "2.0" {
        return Response::error(
            request.id,
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be '2.0'",
        );
    }

    match request.method.as_str() {
        "tools/call" => {
            let invocation: ToolInvocation =
                serde_json::from_value(request.params).unwrap_or_default();
            call_tool(server, request.id, invocation).await
        }
        "tools/list" => Response::ok(request.id, json!({ "tools": tools::catalog() })),
        "resources/list" => Response::ok(request.id, json!({ "resources": [] })),
        "prompts/list" => Response::ok(request.id, json!({ "prompts": [] })),
        method => Response::error(
            request.id,
            METHOD_NOT_FOUND,
            format!("Method Not Found: '{method}'"),
        ),
    }
}

async fn call_tool(server: &FsServer, id: Value, invocation: ToolInvocation) -> Response {
    match server.call_tool(&invocation.name, invocation.arguments).await {
        Ok(result) => match serde_json::to_value(result) {
            Ok(value) => Response::ok(id, value),
            Err(e) => Response::error(id, SERVER_ERROR, e.to_string()),
        },
        Err(ToolError::UnknownTool(name)) => Response::error(
            id,
            METHOD_NOT_FOUND,
            format!("Method Not Found: Unknown tool '{name}'"),
        ),
        Err(e) => Response::error(id, SERVER_ERROR, e.to_string()),
    }
}
