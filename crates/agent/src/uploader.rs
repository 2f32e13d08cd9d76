//! Content uploader — gets attachments into the provider's file storage once.
//!
//! Before uploading, the provider's existing files are searched for one with
//! the same content hash. The listing is paged lazily and re-fetched on every
//! lookup; nothing is cached between calls.

use futures::stream::{self, Stream, TryStreamExt};
use notewright_core::attachment::{Attachment, ProviderRef};
use notewright_core::context::checkpoint;
use notewright_core::error::{ProviderError, Result};
use notewright_core::provider::{Provider, RemoteFile};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct ContentUploader {
    provider: Arc<dyn Provider>,
}

impl ContentUploader {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// The provider's files, one page fetched at a time as the stream is polled.
    fn pages(&self) -> impl Stream<Item = std::result::Result<Vec<RemoteFile>, ProviderError>> + Send + '_ {
        // State: `None` once the last page has been fetched
        stream::try_unfold(Some(None::<String>), move |state| async move {
            let Some(token) = state else {
                return Ok::<_, ProviderError>(None);
            };
            let page = self.provider.list_files(token).await?;
            let next = page.next_page_token.map(Some);
            Ok(Some((page.files, next)))
        })
    }

    /// Find an already uploaded file with the given content hash.
    pub async fn find_by_hash(&self, hash: &str) -> std::result::Result<Option<RemoteFile>, ProviderError> {
        let mut pages = Box::pin(self.pages());
        while let Some(files) = pages.try_next().await? {
            if let Some(found) = files.into_iter().find(|f| f.sha256.as_deref() == Some(hash)) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Make sure `attachment` is in the provider's storage and bound to it.
    pub async fn ensure_uploaded(
        &self,
        attachment: &mut Attachment,
        cancel: &CancellationToken,
    ) -> Result<ProviderRef> {
        if let Some(existing) = attachment.provider_ref() {
            return Ok(existing.clone());
        }
        checkpoint(cancel)?;

        if let Some(file) = self.find_by_hash(attachment.content_hash()).await? {
            debug!(
                display_name = attachment.display_name(),
                uri = %file.uri,
                "Reusing previously uploaded file"
            );
            let provider_ref = ProviderRef {
                uri: file.uri,
                mime_type: if file.mime_type.is_empty() {
                    attachment.mime_type().to_string()
                } else {
                    file.mime_type
                },
            };
            attachment.bind(provider_ref.clone())?;
            return Ok(provider_ref);
        }

        checkpoint(cancel)?;
        let file = self
            .provider
            .upload_file(attachment.data(), attachment.mime_type(), attachment.display_name())
            .await?;
        // A result that arrives after cancellation is discarded
        checkpoint(cancel)?;

        info!(display_name = attachment.display_name(), uri = %file.uri, "Uploaded attachment");
        let provider_ref = ProviderRef {
            uri: file.uri,
            mime_type: attachment.mime_type().to_string(),
        };
        attachment.bind(provider_ref.clone())?;
        Ok(provider_ref)
    }
}
