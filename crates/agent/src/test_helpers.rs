//! Shared test helpers: scripted providers and a recording sleeper.

use crate::retry::Sleeper;
use async_trait::async_trait;
use notewright_core::attachment::content_hash;
use notewright_core::error::ProviderError;
use notewright_core::provider::{
    FilePage, Provider, RemoteFile, ToolCallRequest, TurnRequest, TurnResponse,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A provider that replays a queue of scripted results.
///
/// Once the queue is drained, the last scripted result is repeated; an empty
/// script answers with empty text.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<TurnResponse, ProviderError>>>,
    last: Mutex<Option<Result<TurnResponse, ProviderError>>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<TurnResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn responses(responses: Vec<TurnResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: TurnRequest) -> Result<TurnResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or_else(|| Ok(TurnResponse::default())),
        }
    }
}

/// A provider whose file storage lives in memory, listed `page_size` files per page.
pub struct FileStorageProvider {
    files: Mutex<Vec<RemoteFile>>,
    page_size: usize,
    uploads: Mutex<u32>,
    list_calls: Mutex<u32>,
    yields: bool,
}

impl FileStorageProvider {
    pub fn new(page_size: usize) -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            page_size,
            uploads: Mutex::new(0),
            list_calls: Mutex::new(0),
            yields: false,
        }
    }

    /// Yield to the scheduler before every storage call, like a real network round trip.
    pub fn yielding(mut self) -> Self {
        self.yields = true;
        self
    }

    /// Pre-populate storage with unrelated files.
    pub fn with_noise(self, count: usize) -> Self {
        {
            let mut files = self.files.lock().unwrap();
            for i in 0..count {
                files.push(RemoteFile {
                    name: format!("files/noise{i}"),
                    uri: format!("https://files/noise{i}"),
                    mime_type: "text/plain".into(),
                    sha256: Some(content_hash(format!("noise {i}").as_bytes())),
                    display_name: None,
                });
            }
        }
        self
    }

    pub fn upload_count(&self) -> u32 {
        *self.uploads.lock().unwrap()
    }

    pub fn list_calls(&self) -> u32 {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for FileStorageProvider {
    fn name(&self) -> &str {
        "file_storage"
    }

    async fn complete(&self, _request: TurnRequest) -> Result<TurnResponse, ProviderError> {
        Ok(TurnResponse::default())
    }

    async fn upload_file(
        &self,
        data: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, ProviderError> {
        if self.yields {
            tokio::task::yield_now().await;
        }
        let mut uploads = self.uploads.lock().unwrap();
        *uploads += 1;
        let file = RemoteFile {
            name: format!("files/u{}", *uploads),
            uri: format!("https://files/u{}", *uploads),
            mime_type: mime_type.to_string(),
            sha256: Some(content_hash(data)),
            display_name: Some(display_name.to_string()),
        };
        self.files.lock().unwrap().push(file.clone());
        Ok(file)
    }

    async fn list_files(&self, page_token: Option<String>) -> Result<FilePage, ProviderError> {
        if self.yields {
            tokio::task::yield_now().await;
        }
        *self.list_calls.lock().unwrap() += 1;
        let files = self.files.lock().unwrap();
        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(files.len());
        Ok(FilePage {
            files: files[start.min(end)..end].to_vec(),
            next_page_token: (end < files.len()).then(|| end.to_string()),
        })
    }
}

/// Records every requested delay and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays_ms(&self) -> Vec<u128> {
        self.delays.lock().unwrap().iter().map(Duration::as_millis).collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Helper to create a tool call.
pub fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args,
    }
}
