//! Attachments — local binary inputs destined for the provider's file storage.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use crate::error::{Error, Result};

/// An opaque handle to an asset uploaded to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub uri: String,
    pub mime_type: String,
}

/// A local blob plus its upload state.
///
/// `provider_ref` is written at most once; everything else is fixed at creation.
#[derive(Debug, Clone)]
pub struct Attachment {
    data: Vec<u8>,
    display_name: String,
    mime_type: String,
    content_hash: String,
    provider_ref: Option<ProviderRef>,
}

impl Attachment {
    /// Create an attachment from in-memory bytes.
    pub fn new(data: Vec<u8>, display_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let content_hash = content_hash(&data);
        Self {
            data,
            display_name: display_name.into(),
            mime_type: mime_type.into(),
            content_hash,
            provider_ref: None,
        }
    }

    /// Read a local file, guessing the mime type from its extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = guess_mime_type(path);
        Ok(Self::new(data, display_name, mime_type))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Lower-case hex SHA-256 of the data.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn uploaded(&self) -> bool {
        self.provider_ref.is_some()
    }

    pub fn provider_ref(&self) -> Option<&ProviderRef> {
        self.provider_ref.as_ref()
    }

    /// Bind the provider reference. Fails if one is already bound.
    pub fn bind(&mut self, provider_ref: ProviderRef) -> Result<()> {
        if self.provider_ref.is_some() {
            return Err(Error::Internal(format!(
                "attachment '{}' is already bound to a provider file",
                self.display_name
            )));
        }
        self.provider_ref = Some(provider_ref);
        Ok(())
    }
}

/// Lower-case hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Mime type from a file extension, `application/octet-stream` when unknown.
///
/// A few audio types are pinned to the names the Gemini file API accepts.
pub fn guess_mime_type(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "m4a" => "audio/mp4".to_string(),
        "wav" => "audio/wav".to_string(),
        "mp3" => "audio/mpeg".to_string(),
        _ => mime_guess::from_path(path).first_or_octet_stream().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_content_addressed() {
        let a = Attachment::new(b"same bytes".to_vec(), "a.mp3", "audio/mpeg");
        let b = Attachment::new(b"same bytes".to_vec(), "b.mp3", "audio/mpeg");
        let c = Attachment::new(b"other bytes".to_vec(), "c.mp3", "audio/mpeg");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn known_sha256_vector() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn provider_ref_is_write_once() {
        let mut att = Attachment::new(vec![1, 2, 3], "x.pdf", "application/pdf");
        assert!(!att.uploaded());
        let first = ProviderRef {
            uri: "files/1".into(),
            mime_type: "application/pdf".into(),
        };
        att.bind(first.clone()).unwrap();
        assert!(att.uploaded());
        assert!(att.bind(ProviderRef { uri: "files/2".into(), mime_type: "application/pdf".into() }).is_err());
        assert_eq!(att.provider_ref(), Some(&first));
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_mime_type(Path::new("talk.MP3")), "audio/mpeg");
        assert_eq!(guess_mime_type(Path::new("paper.pdf")), "application/pdf");
        assert_eq!(guess_mime_type(Path::new("blob")), "application/octet-stream");
        assert_eq!(guess_mime_type(Path::new("memo.M4A")), "audio/mp4");
        assert_eq!(guess_mime_type(Path::new("scan.tiff")), "image/tiff");
        assert_eq!(guess_mime_type(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(guess_mime_type(Path::new("photo.png")), "image/png");
    }

    #[tokio::test]
    async fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.m4a");
        std::fs::write(&path, b"audio").unwrap();

        let att = Attachment::from_path(&path).await.unwrap();
        assert_eq!(att.display_name(), "memo.m4a");
        assert_eq!(att.mime_type(), "audio/mp4");
        assert_eq!(att.data(), b"audio");
    }
}
