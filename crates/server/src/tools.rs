//! Tool implementations for the filesystem server.
//!
//! Each tool resolves its path(s) through the sandbox, performs the
//! filesystem action with `tokio::fs`, and frames the outcome as a
//! [`ToolResult`] text payload. Mutating tools are refused up front when the
//! server runs in read-only mode.

use crate::FsServer;
use crate::sandbox::SandboxError;
use crate::walk;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::path::PathBuf;
use std::time::SystemTime;

/// Parameters for reading a file.
#[derive(Debug, Deserialize)]
pub struct ReadFileParams {
    /// Path to the file to read.
    pub path: String,
}

/// Parameters for writing a file.
#[derive(Debug, Deserialize)]
pub struct WriteFileParams {
    /// Path to the file to write.
    pub path: String,
    /// Content to write to the file.
    pub content: String,
}

/// Parameters for listing a directory.
#[derive(Debug, Deserialize)]
pub struct ListDirectoryParams {
    /// Path to the directory to list.
    pub path: String,
}

/// Parameters for creating a directory.
#[derive(Debug, Deserialize)]
pub struct CreateDirectoryParams {
    /// Path of the directory to create.
    pub path: String,
}

/// Parameters for getting file metadata.
#[derive(Debug, Deserialize)]
pub struct GetFileInfoParams {
    /// Path to the file or directory.
    pub path: String,
}

/// Parameters for moving a file.
#[derive(Debug, Deserialize)]
pub struct MoveFileParams {
    /// Source path.
    pub source: String,
    /// Destination path.
    pub destination: String,
}

/// Parameters for searching files.
#[derive(Debug, Deserialize)]
pub struct SearchFilesParams {
    /// Base directory to search in.
    pub path: String,
    /// Glob pattern matched against each entry's file name (e.g. "*.txt").
    pub pattern: String,
}

/// Parameters for building a directory tree.
#[derive(Debug, Deserialize)]
pub struct DirectoryTreeParams {
    /// Path to the root directory for the tree.
    pub path: String,
}

/// Errors from tool execution.
///
/// The JSON-RPC dispatcher collapses every variant except [`UnknownTool`]
/// into error code `-32000`, carrying only the display string; the REST
/// facade maps variants onto HTTP status codes instead.
///
/// [`UnknownTool`]: ToolError::UnknownTool
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("Server is in read-only mode")]
    ReadOnly,
    #[error("invalid arguments: {0}")]
    InvalidParams(String),
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Cannot read directory as file: {}", .0.display())]
    IsADirectory(PathBuf),
    #[error("Path exists but is not a directory: {}", .0.display())]
    Occupied(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result payload of a successful tool call.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
}

/// A single text content item.
#[derive(Debug, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: text.into(),
            }],
        }
    }
}

/// A catalog entry returned by `tools/list`.
#[derive(Debug, Serialize)]
pub struct ToolEntry {
    pub name: &'static str,
    pub description: &'static str,
}

/// The static catalog of the nine exposed tools.
pub fn catalog() -> Vec<ToolEntry> {
    [
        ("read_file", "Read the contents of a file"),
        ("write_file", "Write content to a file"),
        ("list_directory", "List the contents of a directory"),
        ("create_directory", "Create a new directory"),
        ("get_file_info", "Get metadata about a file"),
        ("move_file", "Move or rename a file"),
        ("search_files", "Search for files matching a pattern"),
        ("directory_tree", "Get a recursive directory tree"),
        ("list_allowed_directories", "List the allowed directories"),
    ]
    .into_iter()
    .map(|(name, description)| ToolEntry { name, description })
    .collect()
}

/// File metadata returned by `get_file_info`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    is_directory: bool,
    #[cfg(unix)]
    permissions: String,
}

fn params<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

pub(crate) fn rfc3339(time: SystemTime) -> Option<String> {
    let d = time.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    chrono::DateTime::from_timestamp(d.as_secs() as i64, d.subsec_nanos()).map(|dt| dt.to_rfc3339())
}

impl FsServer {
    /// Dispatch a `tools/call` by tool name.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        match name {
            "read_file" => self.read_file(params(arguments)?).await,
            "write_file" => self.write_file(params(arguments)?).await,
            "list_directory" => self.list_directory(params(arguments)?).await,
            "create_directory" => self.create_directory(params(arguments)?).await,
            "get_file_info" => self.get_file_info(params(arguments)?).await,
            "move_file" => self.move_file(params(arguments)?).await,
            "search_files" => self.search_files(params(arguments)?).await,
            "directory_tree" => self.directory_tree(params(arguments)?).await,
            "list_allowed_directories" => self.list_allowed_directories().await,
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    fn ensure_writable(&self) -> Result<(), ToolError> {
        if self.config.read_only {
            Err(ToolError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Read the complete contents of a text file.
    pub async fn read_file(&self, params: ReadFileParams) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(&params.path)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound(path.clone())
            } else {
                ToolError::Io(e)
            }
        })?;
        if meta.is_dir() {
            return Err(ToolError::IsADirectory(path));
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(ToolResult::text(content))
    }

    /// Create or overwrite a file, creating parent directories as needed.
    pub async fn write_file(&self, params: WriteFileParams) -> Result<ToolResult, ToolError> {
        self.ensure_writable()?;
        let path = self.sandbox.resolve(&params.path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &params.content).await?;
        Ok(ToolResult::text(format!(
            "Successfully wrote to {}",
            path.display()
        )))
    }

    /// List one directory level as `[DIR]`/`[FILE]` lines.
    ///
    /// Entries are sorted lexicographically by file name; this ordering is
    /// part of the contract.
    pub async fn list_directory(&self, params: ListDirectoryParams) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(&params.path)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::DirectoryNotFound(path.clone())
            } else {
                ToolError::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(ToolError::NotADirectory(path));
        }

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&path).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().await?.is_dir();
            entries.push((name, is_dir));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let lines: Vec<String> = entries
            .into_iter()
            .map(|(name, is_dir)| format!("[{}] {name}", if is_dir { "DIR" } else { "FILE" }))
            .collect();
        Ok(ToolResult::text(lines.join("\n")))
    }

    /// Create a directory and all parents; idempotent.
    pub async fn create_directory(
        &self,
        params: CreateDirectoryParams,
    ) -> Result<ToolResult, ToolError> {
        self.ensure_writable()?;
        let path = self.sandbox.resolve(&params.path)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                return Ok(ToolResult::text(format!(
                    "Directory already exists: {}",
                    path.display()
                )));
            }
            Ok(_) => return Err(ToolError::Occupied(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ToolError::Io(e)),
        }
        tokio::fs::create_dir_all(&path).await?;
        Ok(ToolResult::text(format!(
            "Directory created: {}",
            path.display()
        )))
    }

    /// Get metadata about a file or directory as pretty-printed JSON.
    pub async fn get_file_info(&self, params: GetFileInfoParams) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(&params.path)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound(path.clone())
            } else {
                ToolError::Io(e)
            }
        })?;

        let info = FileInfo {
            size: meta.len(),
            created: meta.created().ok().and_then(rfc3339),
            modified: meta.modified().ok().and_then(rfc3339),
            is_directory: meta.is_dir(),
            #[cfg(unix)]
            permissions: {
                use std::os::unix::fs::PermissionsExt;
                format!("{:03o}", meta.permissions().mode() & 0o777)
            },
        };
        Ok(ToolResult::text(serde_json::to_string_pretty(&info)?))
    }

    /// Move or rename a file, creating the destination's parents as needed.
    pub async fn move_file(&self, params: MoveFileParams) -> Result<ToolResult, ToolError> {
        self.ensure_writable()?;
        let source = self.sandbox.resolve(&params.source)?;
        let destination = self.sandbox.resolve(&params.destination)?;

        if let Err(e) = tokio::fs::metadata(&source).await {
            return Err(if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::SourceNotFound(source)
            } else {
                ToolError::Io(e)
            });
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&source, &destination).await?;
        Ok(ToolResult::text(format!(
            "File moved from {} to {}",
            source.display(),
            destination.display()
        )))
    }

    /// Search for files whose name matches a glob pattern.
    pub async fn search_files(&self, params: SearchFilesParams) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(&params.path)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::DirectoryNotFound(path.clone())
            } else {
                ToolError::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(ToolError::NotADirectory(path));
        }

        let pattern = glob::Pattern::new(&params.pattern)?;
        let matches = walk::search(&path, &pattern).await?;
        let lines: Vec<String> = matches.iter().map(|p| p.display().to_string()).collect();
        Ok(ToolResult::text(lines.join("\n")))
    }

    /// Get a recursive tree view of files and directories as JSON.
    pub async fn directory_tree(&self, params: DirectoryTreeParams) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(&params.path)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::DirectoryNotFound(path.clone())
            } else {
                ToolError::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(ToolError::NotADirectory(path));
        }

        let tree = walk::build_tree(&path).await?;
        Ok(ToolResult::text(serde_json::to_string_pretty(&tree)?))
    }

    /// List the allowed directories this server may access.
    pub async fn list_allowed_directories(&self) -> Result<ToolResult, ToolError> {
        let text = self
            .sandbox
            .allowed()
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ToolResult::text(text))
    }

    /// Delete a file or directory.
    ///
    /// Not part of the JSON-RPC tool catalog; exposed only through the REST
    /// facade. Non-recursive deletion of a non-empty directory fails.
    pub async fn delete_entry(&self, raw_path: &str, recursive: bool) -> Result<ToolResult, ToolError> {
        self.ensure_writable()?;
        let path = self.sandbox.resolve(raw_path)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound(path.clone())
            } else {
                ToolError::Io(e)
            }
        })?;

        if meta.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_dir(&path).await?;
            }
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(ToolResult::text(format!(
            "Successfully deleted {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hearth_tools_{name}_{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn server(dir: &Path) -> FsServer {
        FsServer::new(Config {
            port: 0,
            root_dir: dir.to_path_buf(),
            allowed_dirs: vec![dir.to_path_buf()],
            read_only: false,
            api_key: None,
            cors_origin: None,
        })
        .unwrap()
    }

    fn read_only_server(dir: &Path) -> FsServer {
        FsServer::new(Config {
            port: 0,
            root_dir: dir.to_path_buf(),
            allowed_dirs: vec![dir.to_path_buf()],
            read_only: true,
            api_key: None,
            cors_origin: None,
        })
        .unwrap()
    }

    fn text(result: &ToolResult) -> &str {
        &result.content[0].text
    }

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let dir = scratch("round_trip");
        let srv = server(&dir);
        let path = dir.join("notes.txt").display().to_string();

        let written = srv
            .write_file(WriteFileParams {
                path: path.clone(),
                content: "hello".into(),
            })
            .await
            .unwrap();
        assert!(text(&written).starts_with("Successfully wrote to "));

        let read = srv.read_file(ReadFileParams { path }).await.unwrap();
        assert_eq!(text(&read), "hello");
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn write_creates_parent_directories() {
        let dir = scratch("parents");
        let srv = server(&dir);
        let path = dir.join("a/b/c.txt").display().to_string();

        srv.write_file(WriteFileParams {
            path: path.clone(),
            content: "deep".into(),
        })
        .await
        .unwrap();
        let read = srv.read_file(ReadFileParams { path }).await.unwrap();
        assert_eq!(text(&read), "deep");
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn read_of_directory_fails() {
        let dir = scratch("read_dir");
        let srv = server(&dir);
        let err = srv
            .read_file(ReadFileParams {
                path: dir.display().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::IsADirectory(_)));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn tools_reject_paths_outside_sandbox() {
        let dir = scratch("deny");
        let srv = server(&dir);
        let err = srv
            .read_file(ReadFileParams {
                path: "/etc/passwd".into(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Path outside allowed directories"));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn list_directory_is_sorted_and_tagged() {
        let dir = scratch("list");
        let srv = server(&dir);
        fs::create_dir_all(dir.join("zeta")).unwrap();
        fs::write(dir.join("alpha.txt"), "a").unwrap();
        fs::write(dir.join("beta.txt"), "b").unwrap();

        let result = srv
            .list_directory(ListDirectoryParams {
                path: dir.display().to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            text(&result),
            "[FILE] alpha.txt\n[FILE] beta.txt\n[DIR] zeta"
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn create_directory_is_idempotent() {
        let dir = scratch("mkdir");
        let srv = server(&dir);
        let path = dir.join("sub").display().to_string();

        let first = srv
            .create_directory(CreateDirectoryParams { path: path.clone() })
            .await
            .unwrap();
        assert!(text(&first).starts_with("Directory created"));

        let second = srv
            .create_directory(CreateDirectoryParams { path })
            .await
            .unwrap();
        assert!(text(&second).starts_with("Directory already exists"));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn create_directory_over_file_fails() {
        let dir = scratch("mkdir_file");
        let srv = server(&dir);
        fs::write(dir.join("taken"), "x").unwrap();

        let err = srv
            .create_directory(CreateDirectoryParams {
                path: dir.join("taken").display().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Occupied(_)));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn move_file_semantics() {
        let dir = scratch("move");
        let srv = server(&dir);
        let src = dir.join("src.txt").display().to_string();
        let dst = dir.join("nested/dst.txt").display().to_string();

        srv.write_file(WriteFileParams {
            path: src.clone(),
            content: "payload".into(),
        })
        .await
        .unwrap();
        srv.move_file(MoveFileParams {
            source: src.clone(),
            destination: dst.clone(),
        })
        .await
        .unwrap();

        let read = srv.read_file(ReadFileParams { path: dst }).await.unwrap();
        assert_eq!(text(&read), "payload");

        let err = srv.read_file(ReadFileParams { path: src }).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn move_of_missing_source_fails() {
        let dir = scratch("move_missing");
        let srv = server(&dir);
        let err = srv
            .move_file(MoveFileParams {
                source: dir.join("ghost.txt").display().to_string(),
                destination: dir.join("dst.txt").display().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SourceNotFound(_)));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn get_file_info_reports_metadata() {
        let dir = scratch("info");
        let srv = server(&dir);
        fs::write(dir.join("meta.txt"), "12345").unwrap();

        let result = srv
            .get_file_info(GetFileInfoParams {
                path: dir.join("meta.txt").display().to_string(),
            })
            .await
            .unwrap();
        let info: serde_json::Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(info["size"], 5);
        assert_eq!(info["isDirectory"], false);
        #[cfg(unix)]
        assert_eq!(info["permissions"].as_str().unwrap().len(), 3);
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn search_files_matches_recursively() {
        let dir = scratch("search");
        let srv = server(&dir);
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("one.txt"), "x").unwrap();
        fs::write(dir.join("sub/two.txt"), "x").unwrap();
        fs::write(dir.join("sub/three.log"), "x").unwrap();

        let result = srv
            .search_files(SearchFilesParams {
                path: dir.display().to_string(),
                pattern: "*.txt".into(),
            })
            .await
            .unwrap();
        let lines: Vec<&str> = text(&result).lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.ends_with(".txt")));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn read_only_blocks_mutating_tools() {
        let dir = scratch("read_only");
        let srv = read_only_server(&dir);

        let write = srv
            .write_file(WriteFileParams {
                path: dir.join("x.txt").display().to_string(),
                content: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(write, ToolError::ReadOnly));

        let mkdir = srv
            .create_directory(CreateDirectoryParams {
                path: dir.join("sub").display().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(mkdir, ToolError::ReadOnly));

        let mv = srv
            .move_file(MoveFileParams {
                source: dir.join("a").display().to_string(),
                destination: dir.join("b").display().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(mv, ToolError::ReadOnly));

        let del = srv.delete_entry("x.txt", false).await.unwrap_err();
        assert!(matches!(del, ToolError::ReadOnly));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn delete_entry_handles_files_and_directories() {
        let dir = scratch("delete");
        let srv = server(&dir);
        fs::write(dir.join("gone.txt"), "x").unwrap();
        fs::create_dir_all(dir.join("full/inner")).unwrap();

        srv.delete_entry(&dir.join("gone.txt").display().to_string(), false)
            .await
            .unwrap();
        assert!(!dir.join("gone.txt").exists());

        // non-recursive delete of a non-empty directory fails
        let err = srv
            .delete_entry(&dir.join("full").display().to_string(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));

        srv.delete_entry(&dir.join("full").display().to_string(), true)
            .await
            .unwrap();
        assert!(!dir.join("full").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn call_tool_surfaces_unknown_tool() {
        let dir = scratch("unknown");
        let srv = server(&dir);
        let err = srv
            .call_tool("nonexistent_tool", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nonexistent_tool"));
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn call_tool_rejects_missing_arguments() {
        let dir = scratch("bad_args");
        let srv = server(&dir);
        let err = srv
            .call_tool("read_file", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
        fs::remove_dir_all(&dir).ok();
    }
}
