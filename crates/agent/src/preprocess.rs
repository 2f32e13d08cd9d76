//! Preprocessing — turn attachments and an instruction into the first message.
//!
//! Attachments upload in fixed-size concurrent batches; each batch finishes
//! before the next starts. Identical content is uploaded once per build, even
//! when the copies sit in the same batch. The message is: one attachment reference per
//! attachment (input order), the vault tree snapshot, then the instruction.

use futures::future::try_join_all;
use notewright_config::PreprocessConfig;
use notewright_core::attachment::{Attachment, ProviderRef};
use notewright_core::context::checkpoint;
use notewright_core::error::{Error, Result};
use notewright_core::message::Part;
use notewright_core::provider::Provider;
use notewright_core::store::DocumentStore;
use notewright_store::render_tree;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use crate::uploader::ContentUploader;

pub struct Pipeline {
    uploader: ContentUploader,
    store: Arc<dyn DocumentStore>,
    tree_depth: usize,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn DocumentStore>) -> Self {
        let defaults = PreprocessConfig::default();
        Self::from_config(provider, store, &defaults)
    }

    pub fn from_config(
        provider: Arc<dyn Provider>,
        store: Arc<dyn DocumentStore>,
        config: &PreprocessConfig,
    ) -> Self {
        Self {
            uploader: ContentUploader::new(provider),
            store,
            tree_depth: config.tree_depth.max(1),
            batch_size: config.upload_batch_size.max(1),
        }
    }

    pub fn with_tree_depth(mut self, depth: usize) -> Self {
        self.tree_depth = depth.max(1);
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Build the parts of the first user message.
    pub async fn build(
        &self,
        attachments: &mut [Attachment],
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Part>> {
        let mut parts = Vec::with_capacity(attachments.len() + 2);
        // Content hash -> reference, shared by duplicates in this and later batches
        let mut known: HashMap<String, ProviderRef> = HashMap::new();

        for (index, batch) in attachments.chunks_mut(self.batch_size).enumerate() {
            checkpoint(cancel)?;
            let mut pending = HashSet::new();
            let uploads = batch
                .iter_mut()
                .filter(|attachment| {
                    !attachment.uploaded()
                        && !known.contains_key(attachment.content_hash())
                        && pending.insert(attachment.content_hash().to_string())
                })
                .map(|attachment| self.uploader.ensure_uploaded(attachment, cancel));
            let uploads: Vec<_> = uploads.collect();
            debug!(batch = index, uploads = uploads.len(), "Uploading attachment batch");
            try_join_all(uploads).await?;

            for attachment in batch.iter() {
                if let Some(provider_ref) = attachment.provider_ref() {
                    known
                        .entry(attachment.content_hash().to_string())
                        .or_insert_with(|| provider_ref.clone());
                }
            }
            for attachment in batch.iter_mut() {
                if !attachment.uploaded() {
                    let shared = known.get(attachment.content_hash()).cloned().ok_or_else(|| {
                        Error::Internal(format!("no upload for '{}'", attachment.display_name()))
                    })?;
                    attachment.bind(shared)?;
                }
                if let Some(provider_ref) = attachment.provider_ref() {
                    parts.push(Part::AttachmentRef {
                        uri: provider_ref.uri.clone(),
                        mime_type: provider_ref.mime_type.clone(),
                    });
                }
            }
        }

        checkpoint(cancel)?;
        let tree = render_tree(self.store.as_ref(), "/", self.tree_depth, true).await?;
        parts.push(Part::text(format!("Current vault structure:\n{tree}")));
        parts.push(Part::text(instruction));
        Ok(parts)
    }
}
