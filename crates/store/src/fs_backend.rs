//! Filesystem-backed store — a vault is a directory of markdown files.
//!
//! Hidden entries (names starting with `.`) are invisible to listings and
//! link resolution but can still be addressed directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notewright_core::error::StoreError;
use notewright_core::store::{
    join, normalize_path, parent_of, DocumentMeta, DocumentStore, LinkRef, Node,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::links;

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Open a vault rooted at `root`. The directory must already exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::NotFound(root.display().to_string()));
        }
        debug!(root = %root.display(), "Filesystem vault opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf), StoreError> {
        let normalized = normalize_path(path)?;
        let full = if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&normalized)
        };
        Ok((normalized, full))
    }

    async fn require_folder(&self, path: &str) -> Result<(), StoreError> {
        match self.node(path).await? {
            Some(node) if node.is_folder() => Ok(()),
            Some(_) => Err(StoreError::NotAFolder(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }
}

fn io_error(path: &str, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::NotFound(path.to_string())
    } else {
        StoreError::Io {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn node(&self, path: &str) -> Result<Option<Node>, StoreError> {
        let (normalized, full) = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_dir() => Ok(Some(Node::folder(normalized))),
            Ok(_) => Ok(Some(Node::document(normalized))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&normalized, e)),
        }
    }

    async fn read(&self, path: &str) -> Result<String, StoreError> {
        let (normalized, full) = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| io_error(&normalized, e))
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let (normalized, full) = self.resolve(path)?;
        if normalized.is_empty() {
            return Err(StoreError::InvalidPath {
                path: normalized,
                reason: "cannot write to the vault root".into(),
            });
        }
        self.require_folder(parent_of(&normalized)).await?;
        if full.is_dir() {
            return Err(StoreError::InvalidPath {
                path: normalized,
                reason: "is a folder".into(),
            });
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| io_error(&normalized, e))?;
        debug!(path = %normalized, bytes = content.len(), "Document written");
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        let (normalized, full) = self.resolve(path)?;
        if self.exists(&normalized).await? {
            return Err(StoreError::AlreadyExists(normalized));
        }
        self.require_folder(parent_of(&normalized)).await?;
        tokio::fs::create_dir(&full)
            .await
            .map_err(|e| io_error(&normalized, e))
    }

    async fn rename(&self, path: &str, new_path: &str) -> Result<(), StoreError> {
        let (from, from_full) = self.resolve(path)?;
        let (to, to_full) = self.resolve(new_path)?;
        if from.is_empty() || !self.exists(&from).await? {
            return Err(StoreError::NotFound(from));
        }
        if self.exists(&to).await? {
            return Err(StoreError::AlreadyExists(to));
        }
        if to.starts_with(&format!("{from}/")) {
            return Err(StoreError::InvalidPath {
                path: to,
                reason: "cannot move a folder into itself".into(),
            });
        }
        self.require_folder(parent_of(&to)).await?;
        tokio::fs::rename(&from_full, &to_full)
            .await
            .map_err(|e| io_error(&from, e))?;
        debug!(from = %from, to = %to, "Node moved");
        Ok(())
    }

    async fn list_children(&self, path: &str) -> Result<Vec<Node>, StoreError> {
        let (normalized, full) = self.resolve(path)?;
        self.require_folder(&normalized).await?;

        let mut dir = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| io_error(&normalized, e))?;
        let mut children = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| io_error(&normalized, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            let child = join(&normalized, &name);
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io_error(&child, e))?;
            children.push(if file_type.is_dir() {
                Node::folder(child)
            } else {
                Node::document(child)
            });
        }
        Ok(children)
    }

    async fn all_document_paths(&self) -> Result<Vec<String>, StoreError> {
        let mut documents = Vec::new();
        let mut pending = vec![String::new()];
        while let Some(folder) = pending.pop() {
            for child in self.list_children(&folder).await? {
                if child.is_folder() {
                    pending.push(child.path);
                } else {
                    documents.push(child.path);
                }
            }
        }
        documents.sort();
        Ok(documents)
    }

    async fn resolve_link(&self, link: &str, from_path: &str) -> Result<Option<Node>, StoreError> {
        let documents = self.all_document_paths().await?;
        Ok(links::resolve_link(link, from_path, &documents).map(Node::document))
    }

    async fn links_of(&self, path: &str) -> Result<Vec<LinkRef>, StoreError> {
        let content = self.read(path).await?;
        Ok(links::parse_links(&content))
    }

    async fn metadata(&self, path: &str) -> Result<DocumentMeta, StoreError> {
        let (normalized, full) = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| io_error(&normalized, e))?;
        if meta.is_dir() {
            return Err(StoreError::InvalidPath {
                path: normalized,
                reason: "is a folder".into(),
            });
        }
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(DocumentMeta {
            size: meta.len(),
            modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault() -> (TempDir, FsDocumentStore) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("notes/sub")).unwrap();
        std::fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
        std::fs::write(dir.path().join("index.md"), "See [[Topic]] and [[Missing]]").unwrap();
        std::fs::write(dir.path().join("notes/sub/Topic.md"), "topic").unwrap();
        std::fs::write(dir.path().join(".obsidian/app.json"), "{}").unwrap();
        let store = FsDocumentStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn open_missing_directory_fails() {
        assert!(FsDocumentStore::open("/definitely/not/here").is_err());
    }

    #[tokio::test]
    async fn walk_skips_hidden_entries() {
        let (_dir, store) = vault();
        let paths = store.all_document_paths().await.unwrap();
        assert_eq!(paths, vec!["index.md", "notes/sub/Topic.md"]);
    }

    #[tokio::test]
    async fn write_read_roundtrip() {
        let (_dir, store) = vault();
        store.write("notes/new.md", "# New").await.unwrap();
        assert_eq!(store.read("notes/new.md").await.unwrap(), "# New");
        assert!(matches!(
            store.write("absent/new.md", "x").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rename_and_refuse_overwrite() {
        let (_dir, store) = vault();
        store.rename("notes/sub", "moved").await.unwrap();
        assert!(store.exists("moved/Topic.md").await.unwrap());
        assert!(matches!(
            store.rename("index.md", "moved/Topic.md").await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn link_resolution_uses_basename() {
        let (_dir, store) = vault();
        let links = store.links_of("index.md").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(
            store.resolve_link("Topic", "index.md").await.unwrap(),
            Some(Node::document("notes/sub/Topic.md"))
        );
        assert!(store.resolve_link("Missing", "index.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn metadata_and_folder_errors() {
        let (_dir, store) = vault();
        assert_eq!(store.metadata("notes/sub/Topic.md").await.unwrap().size, 5);
        assert!(store.metadata("notes").await.is_err());
        assert!(matches!(
            store.create_folder("notes").await,
            Err(StoreError::AlreadyExists(_))
        ));
    }
}
