//! Bounded recursive directory traversal.
//!
//! Shared by `directory_tree` and `search_files`. Both walks carry an
//! explicit depth limit and a set of visited canonical paths so that a
//! symlink loop terminates instead of recursing forever; on detection the
//! walk fails closed and skips the offending subtree.

use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum directory depth either walk will descend.
pub const MAX_DEPTH: usize = 64;

/// A node in a recursive directory listing.
///
/// A `file` node never carries `children`; a `directory` node always does,
/// possibly empty. When a directory cannot be read its `children` stay empty
/// and `error` explains why, so callers can tell an empty directory from an
/// unreadable one.
#[derive(Debug, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TreeNode {
    fn file(name: String) -> Self {
        Self {
            name,
            kind: "file",
            children: None,
            error: None,
        }
    }

    fn directory(name: String, children: Vec<TreeNode>, error: Option<String>) -> Self {
        Self {
            name,
            kind: "directory",
            children: Some(children),
            error,
        }
    }
}

/// Recursively build a [`TreeNode`] for `path`.
///
/// The root must exist; below it, entries that fail to stat are skipped and
/// unreadable directories degrade to an empty-children node with `error` set.
pub async fn build_tree(path: &Path) -> std::io::Result<TreeNode> {
    let mut visited = HashSet::new();
    tree_node(path, 0, &mut visited).await
}

fn tree_node<'a>(
    path: &'a Path,
    depth: usize,
    visited: &'a mut HashSet<PathBuf>,
) -> BoxFuture<'a, std::io::Result<TreeNode>> {
    Box::pin(async move {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_dir() {
            return Ok(TreeNode::file(name));
        }

        if depth >= MAX_DEPTH {
            return Ok(TreeNode::directory(
                name,
                Vec::new(),
                Some("max depth exceeded".into()),
            ));
        }

        let canonical = match tokio::fs::canonicalize(path).await {
            Ok(canonical) => canonical,
            Err(e) => return Ok(TreeNode::directory(name, Vec::new(), Some(e.to_string()))),
        };
        if !visited.insert(canonical) {
            return Ok(TreeNode::directory(
                name,
                Vec::new(),
                Some("symlink cycle detected".into()),
            ));
        }

        let mut read_dir = match tokio::fs::read_dir(path).await {
            Ok(rd) => rd,
            Err(e) => return Ok(TreeNode::directory(name, Vec::new(), Some(e.to_string()))),
        };

        let mut children = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let child_path = entry.path();
            match tree_node(&child_path, depth + 1, visited).await {
                Ok(child) => children.push(child),
                Err(_) => continue, // skip entries we cannot stat
            }
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(TreeNode::directory(name, children, None))
    })
}

/// Recursively collect files under `base` whose file name matches `pattern`.
///
/// Results are sorted. Subdirectories that fail to read are skipped, matching
/// the degrade-don't-fail behavior of the tree walk.
pub async fn search(base: &Path, pattern: &glob::Pattern) -> std::io::Result<Vec<PathBuf>> {
    let mut visited = HashSet::new();
    let mut matches = Vec::new();
    search_dir(base, pattern, 0, &mut visited, &mut matches).await?;
    matches.sort();
    Ok(matches)
}

fn search_dir<'a>(
    dir: &'a Path,
    pattern: &'a glob::Pattern,
    depth: usize,
    visited: &'a mut HashSet<PathBuf>,
    matches: &'a mut Vec<PathBuf>,
) -> BoxFuture<'a, std::io::Result<()>> {
    Box::pin(async move {
        if depth >= MAX_DEPTH {
            return Ok(());
        }

        let canonical = tokio::fs::canonicalize(dir).await?;
        if !visited.insert(canonical) {
            return Ok(());
        }

        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            let meta = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(_) => continue,
            };
            if meta.is_dir() {
                // unreadable subtree is skipped, not fatal
                search_dir(&path, pattern, depth + 1, visited, matches)
                    .await
                    .ok();
            } else if pattern.matches(&entry.file_name().to_string_lossy()) {
                matches.push(path);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hearth_walk_{name}_{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn assert_well_formed(node: &TreeNode) {
        match node.kind {
            "file" => assert!(node.children.is_none()),
            "directory" => {
                for child in node.children.as_ref().expect("directory without children") {
                    assert_well_formed(child);
                }
            }
            other => panic!("unexpected node type {other}"),
        }
    }

    #[tokio::test]
    async fn tree_is_well_formed_and_sorted() {
        let dir = scratch("tree");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("b.txt"), "b").unwrap();
        fs::write(dir.join("a.txt"), "a").unwrap();
        fs::write(dir.join("sub/nested.txt"), "n").unwrap();

        let tree = build_tree(&dir).await.unwrap();
        assert_eq!(tree.kind, "directory");
        assert_well_formed(&tree);

        let names: Vec<&str> = tree
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn tree_of_single_file() {
        let dir = scratch("single");
        let file = dir.join("only.txt");
        fs::write(&file, "x").unwrap();

        let tree = build_tree(&file).await.unwrap();
        assert_eq!(tree.kind, "file");
        assert!(tree.children.is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tree_terminates_on_symlink_cycle() {
        let dir = scratch("cycle");
        fs::create_dir_all(dir.join("sub")).unwrap();
        std::os::unix::fs::symlink(&dir, dir.join("sub/loop")).unwrap();

        let tree = build_tree(&dir).await.unwrap();
        assert_well_formed(&tree);
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tree_keeps_unreadable_directory_with_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch("unreadable");
        let locked = dir.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // running as root bypasses permission bits; nothing to observe then
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            fs::remove_dir_all(&dir).ok();
            return;
        }

        let tree = build_tree(&dir).await.unwrap();
        assert_well_formed(&tree);
        let child = tree
            .children
            .as_ref()
            .unwrap()
            .iter()
            .find(|c| c.name == "locked")
            .expect("unreadable directory dropped from tree");
        assert_eq!(child.kind, "directory");
        assert_eq!(child.children.as_ref().unwrap().len(), 0);
        assert!(child.error.is_some());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn search_matches_base_names() {
        let dir = scratch("search");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("keep.txt"), "x").unwrap();
        fs::write(dir.join("skip.log"), "x").unwrap();
        fs::write(dir.join("sub/also.txt"), "x").unwrap();

        let pattern = glob::Pattern::new("*.txt").unwrap();
        let found = search(&dir, &pattern).await.unwrap();
        assert_eq!(found, vec![dir.join("keep.txt"), dir.join("sub/also.txt")]);
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn search_terminates_on_symlink_cycle() {
        let dir = scratch("search_cycle");
        std::os::unix::fs::symlink(&dir, dir.join("loop")).unwrap();
        fs::write(dir.join("found.txt"), "x").unwrap();

        let pattern = glob::Pattern::new("*.txt").unwrap();
        let found = search(&dir, &pattern).await.unwrap();
        assert_eq!(found, vec![dir.join("found.txt")]);
        fs::remove_dir_all(&dir).ok();
    }
}
