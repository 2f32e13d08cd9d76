//! DocumentStore trait — the capability surface over a hierarchical document tree.
//!
//! Paths are vault-relative and `/`-separated. The root is the empty string;
//! `"/"` and leading or trailing slashes are normalised away.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Document,
}

/// A file or folder in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Normalised vault-relative path
    pub path: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Folder,
        }
    }

    pub fn document(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Document,
        }
    }

    /// Last path segment (the root is named "/").
    pub fn name(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            file_name(&self.path)
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// An outbound link reference found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    /// The link target as written, without alias or heading (e.g., "Projects/Idea")
    pub link: String,
    /// The full original text of the reference (e.g., "[[Projects/Idea#Intro|idea]]")
    pub original: String,
}

/// Size and modification time of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// The document store consumed by the tools and the preprocessing pipeline.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// A human-readable name for this backend (e.g., "fs", "in_memory").
    fn name(&self) -> &str;

    /// Look up a file or folder.
    async fn node(&self, path: &str) -> Result<Option<Node>, StoreError>;

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.node(path).await?.is_some())
    }

    async fn read(&self, path: &str) -> Result<String, StoreError>;

    /// Create or overwrite a document. The parent folder must exist.
    async fn write(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Create a single folder. The parent folder must exist.
    async fn create_folder(&self, path: &str) -> Result<(), StoreError>;

    /// Move or rename a file or folder.
    async fn rename(&self, path: &str, new_path: &str) -> Result<(), StoreError>;

    /// Direct children of a folder, in no particular order.
    async fn list_children(&self, path: &str) -> Result<Vec<Node>, StoreError>;

    /// Every document path in the store, sorted.
    async fn all_document_paths(&self) -> Result<Vec<String>, StoreError>;

    /// Resolve a link as written in the document at `from_path`.
    async fn resolve_link(&self, link: &str, from_path: &str) -> Result<Option<Node>, StoreError>;

    /// Outbound link references of a document.
    async fn links_of(&self, path: &str) -> Result<Vec<LinkRef>, StoreError>;

    async fn metadata(&self, path: &str) -> Result<DocumentMeta, StoreError>;
}

/// Normalise a vault-relative path: forward slashes, no empty or `.` segments,
/// no leading or trailing slash. Rejects `..` segments.
pub fn normalize_path(path: &str) -> Result<String, StoreError> {
    let unified = path.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StoreError::InvalidPath {
                    path: path.to_string(),
                    reason: "parent directory segments are not allowed".into(),
                });
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Parent folder of a normalised path (the root for top-level entries).
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of a normalised path.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a folder and a name.
pub fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalisation() {
        assert_eq!(normalize_path("/").unwrap(), "");
        assert_eq!(normalize_path("").unwrap(), "");
        assert_eq!(normalize_path("/a//b/./c.md/").unwrap(), "a/b/c.md");
        assert_eq!(normalize_path("a\\b.md").unwrap(), "a/b.md");
        assert_eq!(normalize_path("\\Inbox\\2024\\note.md").unwrap(), "Inbox/2024/note.md");
        assert!(normalize_path("a/../../etc/passwd").is_err());
    }

    #[test]
    fn path_helpers() {
        assert_eq!(parent_of("a/b/c.md"), "a/b");
        assert_eq!(parent_of("c.md"), "");
        assert_eq!(file_name("a/b/c.md"), "c.md");
        assert_eq!(join("", "x.md"), "x.md");
        assert_eq!(join("a", "x.md"), "a/x.md");
    }

    #[test]
    fn node_names() {
        assert_eq!(Node::folder("").name(), "/");
        assert_eq!(Node::document("z/a.md").name(), "a.md");
        assert!(Node::folder("z").is_folder());
    }
}
