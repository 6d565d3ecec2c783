//! REST facade for the dashboard frontend.
//!
//! Thin routes under `/api/filesystem` sharing the sandbox and tool layer
//! with the JSON-RPC surface. Unlike JSON-RPC, failures map onto HTTP
//! status codes: 400 for missing/invalid parameters, 403 for sandbox
//! denial or read-only mode, 404 for missing paths, 500 otherwise, with a
//! `{ "error": <message> }` body.

use crate::FsServer;
use crate::tools::{
    CreateDirectoryParams, ToolError, WriteFileParams, rfc3339,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub fn router() -> Router<Arc<FsServer>> {
    Router::new()
        .route("/list", get(list))
        .route("/read", get(read))
        .route("/write", post(write))
        .route("/mkdir", post(mkdir))
        .route("/delete", delete(remove))
}

/// Error wrapper giving tool failures an HTTP status.
#[derive(Debug)]
enum RestError {
    MissingParam(&'static str),
    Tool(ToolError),
}

impl From<ToolError> for RestError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingParam(name) => (
                StatusCode::BAD_REQUEST,
                format!("{name} parameter is required"),
            ),
            Self::Tool(err) => {
                let status = match &err {
                    ToolError::Sandbox(_) | ToolError::ReadOnly => StatusCode::FORBIDDEN,
                    ToolError::NotFound(_)
                    | ToolError::SourceNotFound(_)
                    | ToolError::DirectoryNotFound(_) => StatusCode::NOT_FOUND,
                    ToolError::InvalidParams(_) | ToolError::Pattern(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

/// An entry in the `/list` response.
#[derive(Debug, Serialize)]
struct FileEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
}

async fn list(
    State(server): State<Arc<FsServer>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<serde_json::Value>, RestError> {
    let path = match query.path {
        Some(raw) => server.sandbox.resolve(&raw).map_err(ToolError::from)?,
        // config guarantees at least one allowed directory
        None => match server.sandbox.allowed().first() {
            Some(dir) => dir.clone(),
            None => return Err(RestError::MissingParam("path")),
        },
    };
    let meta = tokio::fs::metadata(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::DirectoryNotFound(path.clone())
        } else {
            ToolError::Io(e)
        }
    })?;
    if !meta.is_dir() {
        return Err(ToolError::NotADirectory(path).into());
    }

    let mut files = Vec::new();
    let mut read_dir = tokio::fs::read_dir(&path)
        .await
        .map_err(ToolError::from)?;
    while let Some(entry) = read_dir.next_entry().await.map_err(ToolError::from)? {
        let entry_path = entry.path();
        let meta = match tokio::fs::metadata(&entry_path).await {
            Ok(m) => m,
            Err(_) => continue, // entry vanished or is a broken symlink
        };
        files.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry_path.display().to_string(),
            kind: if meta.is_dir() { "directory" } else { "file" },
            size: meta.is_file().then(|| meta.len()),
            modified: meta.modified().ok().and_then(rfc3339),
            created: meta.created().ok().and_then(rfc3339),
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(json!({ "files": files })))
}

async fn read(
    State(server): State<Arc<FsServer>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<serde_json::Value>, RestError> {
    let raw = query.path.ok_or(RestError::MissingParam("path"))?;
    let result = server
        .read_file(crate::tools::ReadFileParams { path: raw.clone() })
        .await?;
    Ok(Json(json!({
        "file": {
            "path": raw,
            "content": result.content[0].text,
            "encoding": "utf8",
        }
    })))
}

// Body fields are optional so that a missing parameter surfaces as a 400
// with the JSON error body rather than the extractor's 422 rejection.
#[derive(Debug, Deserialize)]
struct WriteBody {
    path: Option<String>,
    content: Option<String>,
}

async fn write(
    State(server): State<Arc<FsServer>>,
    Json(body): Json<WriteBody>,
) -> Result<Json<serde_json::Value>, RestError> {
    let path = body.path.ok_or(RestError::MissingParam("path"))?;
    let content = body.content.ok_or(RestError::MissingParam("content"))?;
    server
        .write_file(WriteFileParams {
            path: path.clone(),
            content,
        })
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("File {path} written successfully"),
    })))
}

#[derive(Debug, Deserialize)]
struct MkdirBody {
    path: Option<String>,
}

async fn mkdir(
    State(server): State<Arc<FsServer>>,
    Json(body): Json<MkdirBody>,
) -> Result<Json<serde_json::Value>, RestError> {
    let path = body.path.ok_or(RestError::MissingParam("path"))?;
    server
        .create_directory(CreateDirectoryParams { path: path.clone() })
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Directory {path} created successfully"),
    })))
}

#[derive(Debug, Deserialize)]
struct DeleteBody {
    path: Option<String>,
    #[serde(default)]
    recursive: bool,
}

async fn remove(
    State(server): State<Arc<FsServer>>,
    Json(body): Json<DeleteBody>,
) -> Result<Json<serde_json::Value>, RestError> {
    let path = body.path.ok_or(RestError::MissingParam("path"))?;
    server.delete_entry(&path, body.recursive).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{path} deleted successfully"),
    })))
}
