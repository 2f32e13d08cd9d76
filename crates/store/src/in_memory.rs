//! In-memory store — useful for testing and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notewright_core::error::StoreError;
use notewright_core::store::{
    normalize_path, parent_of, DocumentMeta, DocumentStore, LinkRef, Node, NodeKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::links;

#[derive(Debug, Clone)]
enum Entry {
    Folder,
    Document {
        content: String,
        modified: DateTime<Utc>,
    },
}

/// A store that keeps every document in a sorted map.
/// The root folder always exists and is never stored explicitly.
pub struct InMemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Build a store from `(path, content)` pairs, creating ancestor folders.
    ///
    /// Paths that fail normalisation are skipped.
    pub fn with_documents<'a>(documents: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut map = BTreeMap::new();
        let now = Utc::now();
        for (path, content) in documents {
            let Ok(path) = normalize_path(path) else {
                continue;
            };
            let mut folder = parent_of(&path);
            while !folder.is_empty() {
                map.insert(folder.to_string(), Entry::Folder);
                folder = parent_of(folder);
            }
            map.insert(
                path,
                Entry::Document {
                    content: content.to_string(),
                    modified: now,
                },
            );
        }
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    fn node_kind(entries: &BTreeMap<String, Entry>, path: &str) -> Option<NodeKind> {
        if path.is_empty() {
            return Some(NodeKind::Folder);
        }
        entries.get(path).map(|e| match e {
            Entry::Folder => NodeKind::Folder,
            Entry::Document { .. } => NodeKind::Document,
        })
    }

    fn require_folder(entries: &BTreeMap<String, Entry>, path: &str) -> Result<(), StoreError> {
        match Self::node_kind(entries, path) {
            Some(NodeKind::Folder) => Ok(()),
            Some(NodeKind::Document) => Err(StoreError::NotAFolder(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn document_paths(entries: &BTreeMap<String, Entry>) -> Vec<String> {
        entries
            .iter()
            .filter(|(_, e)| matches!(e, Entry::Document { .. }))
            .map(|(p, _)| p.clone())
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn node(&self, path: &str) -> Result<Option<Node>, StoreError> {
        let path = normalize_path(path)?;
        let entries = self.entries.read().await;
        Ok(Self::node_kind(&entries, &path).map(|kind| Node { path, kind }))
    }

    async fn read(&self, path: &str) -> Result<String, StoreError> {
        let path = normalize_path(path)?;
        match self.entries.read().await.get(&path) {
            Some(Entry::Document { content, .. }) => Ok(content.clone()),
            Some(Entry::Folder) => Err(StoreError::InvalidPath {
                path,
                reason: "is a folder".into(),
            }),
            None => Err(StoreError::NotFound(path)),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let path = normalize_path(path)?;
        if path.is_empty() {
            return Err(StoreError::InvalidPath {
                path,
                reason: "cannot write to the vault root".into(),
            });
        }
        let mut entries = self.entries.write().await;
        Self::require_folder(&entries, parent_of(&path))?;
        if let Some(Entry::Folder) = entries.get(&path) {
            return Err(StoreError::InvalidPath {
                path,
                reason: "is a folder".into(),
            });
        }
        entries.insert(
            path,
            Entry::Document {
                content: content.to_string(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        let path = normalize_path(path)?;
        let mut entries = self.entries.write().await;
        if Self::node_kind(&entries, &path).is_some() {
            return Err(StoreError::AlreadyExists(path));
        }
        Self::require_folder(&entries, parent_of(&path))?;
        entries.insert(path, Entry::Folder);
        Ok(())
    }

    async fn rename(&self, path: &str, new_path: &str) -> Result<(), StoreError> {
        let from = normalize_path(path)?;
        let to = normalize_path(new_path)?;
        let mut entries = self.entries.write().await;

        if from.is_empty() || !entries.contains_key(&from) {
            return Err(StoreError::NotFound(from));
        }
        if Self::node_kind(&entries, &to).is_some() {
            return Err(StoreError::AlreadyExists(to));
        }
        if to.starts_with(&format!("{from}/")) {
            return Err(StoreError::InvalidPath {
                path: to,
                reason: "cannot move a folder into itself".into(),
            });
        }
        Self::require_folder(&entries, parent_of(&to))?;

        let prefix = format!("{from}/");
        let moved: Vec<String> = entries
            .keys()
            .filter(|k| **k == from || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = entries.remove(&old) {
                let renamed = format!("{to}{}", &old[from.len()..]);
                entries.insert(renamed, entry);
            }
        }
        Ok(())
    }

    async fn list_children(&self, path: &str) -> Result<Vec<Node>, StoreError> {
        let path = normalize_path(path)?;
        let entries = self.entries.read().await;
        Self::require_folder(&entries, &path)?;
        Ok(entries
            .iter()
            .filter(|(p, _)| parent_of(p) == path)
            .map(|(p, e)| match e {
                Entry::Folder => Node::folder(p.clone()),
                Entry::Document { .. } => Node::document(p.clone()),
            })
            .collect())
    }

    async fn all_document_paths(&self) -> Result<Vec<String>, StoreError> {
        Ok(Self::document_paths(&*self.entries.read().await))
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
        let path = normalize_path(path)?;
        match self.entries.read().await.get(&path) {
            Some(Entry::Document { content, modified }) => Ok(DocumentMeta {
                size: content.len() as u64,
                modified: *modified,
            }),
            Some(Entry::Folder) => Err(StoreError::InvalidPath {
                path,
                reason: "is a folder".into(),
            }),
            None => Err(StoreError::NotFound(path)),
        }
    }
}
