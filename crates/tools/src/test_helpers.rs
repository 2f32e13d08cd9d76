//! Shared test helpers: a store wrapper that counts walks and fails chosen reads.

use async_trait::async_trait;
use notewright_core::error::StoreError;
use notewright_core::store::{DocumentMeta, DocumentStore, LinkRef, Node};
use notewright_store::InMemoryStore;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct InstrumentedStore {
    inner: InMemoryStore,
    failing_reads: Vec<String>,
    walks: AtomicUsize,
}

impl InstrumentedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            failing_reads: Vec::new(),
            walks: AtomicUsize::new(0),
        }
    }

    /// Make `read` of `path` fail with an I/O error.
    pub fn failing_read(mut self, path: &str) -> Self {
        self.failing_reads.push(path.to_string());
        self
    }

    /// How many times the whole vault was enumerated.
    pub fn walks(&self) -> usize {
        self.walks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InstrumentedStore {
    fn name(&self) -> &str {
        "instrumented"
    }

    async fn node(&self, path: &str) -> Result<Option<Node>, StoreError> {
        self.inner.node(path).await
    }

    async fn read(&self, path: &str) -> Result<String, StoreError> {
        if self.failing_reads.iter().any(|p| p == path) {
            return Err(StoreError::Io {
                path: path.to_string(),
                reason: "device not ready".into(),
            });
        }
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), StoreError> {
        self.inner.write(path, content).await
    }

    async fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        self.inner.create_folder(path).await
    }

    async fn rename(&self, path: &str, new_path: &str) -> Result<(), StoreError> {
        self.inner.rename(path, new_path).await
    }

    async fn list_children(&self, path: &str) -> Result<Vec<Node>, StoreError> {
        self.inner.list_children(path).await
    }

    async fn all_document_paths(&self) -> Result<Vec<String>, StoreError> {
        self.walks.fetch_add(1, Ordering::SeqCst);
        self.inner.all_document_paths().await
    }

    async fn resolve_link(&self, link: &str, from_path: &str) -> Result<Option<Node>, StoreError> {
        let documents = self.all_document_paths().await?;
        Ok(notewright_store::resolve_link(link, from_path, &documents).map(Node::document))
    }

    async fn links_of(&self, path: &str) -> Result<Vec<LinkRef>, StoreError> {
        let content = self.read(path).await?;
        Ok(notewright_store::parse_links(&content))
    }

    async fn metadata(&self, path: &str) -> Result<DocumentMeta, StoreError> {
        self.inner.metadata(path).await
    }
}
