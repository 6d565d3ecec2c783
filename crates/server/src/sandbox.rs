//! Path validation and security for the filesystem server.
//!
//! All filesystem operations must pass through [`Sandbox::resolve`] to ensure
//! the requested path is within the server's allowed directories. Resolution
//! is purely lexical so that a denied path is rejected before any filesystem
//! I/O happens on it.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors from path validation.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The path is outside all allowed directories.
    #[error("Path outside allowed directories: {}", .0.display())]
    Outside(PathBuf),
    /// The path contains a null byte.
    #[error("path contains null byte")]
    NullByte,
}

/// The fixed set of directories the server may touch.
///
/// Built once at startup from the configuration and injected into every
/// handler; immutable for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    allowed: Vec<PathBuf>,
}

impl Sandbox {
    /// Build the sandbox: normalize every allowed directory to an absolute
    /// path (relative entries resolve against `root`) and create any that
    /// are missing.
    pub fn new(root: &Path, dirs: Vec<PathBuf>) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = absolutize(root, &cwd);

        let mut allowed = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let dir = absolutize(&dir, &root);
            std::fs::create_dir_all(&dir)?;
            allowed.push(dir);
        }

        Ok(Self { root, allowed })
    }

    /// Validate a caller-supplied path and return its resolved absolute form.
    ///
    /// Steps:
    /// 1. Reject paths containing null bytes
    /// 2. Resolve lexically: relative paths join the configured root, then
    ///    `.` and `..` components are folded (`..` clamps at the root of the
    ///    filesystem)
    /// 3. Verify the resolved path equals an allowed directory or is a
    ///    descendant of one
    ///
    /// The containment check is component-wise, so `/data2` is never
    /// considered inside `/data`.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, SandboxError> {
        if raw.contains('\0') {
            return Err(SandboxError::NullByte);
        }

        let resolved = absolutize(Path::new(raw), &self.root);
        if self.allowed.iter().any(|dir| resolved.starts_with(dir)) {
            Ok(resolved)
        } else {
            Err(SandboxError::Outside(resolved))
        }
    }

    /// The allowed directories, in configuration order.
    pub fn allowed(&self) -> &[PathBuf] {
        &self.allowed
    }
}

/// Resolve `path` to an absolute, lexically normalized form against `base`.
///
/// No filesystem access: symlinks are not followed and existence is not
/// checked.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // pop() refuses to remove a root or prefix, which clamps
                // `..` at the top of the filesystem
                out.pop();
            }
            c => out.push(c),
        }
    }
    out
}
