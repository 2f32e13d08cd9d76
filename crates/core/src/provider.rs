//! Provider trait — the abstraction over the language-model backend.
//!
//! A Provider knows how to send a conversation to a model and get a response
//! back (complete or streamed), and how to manage binary assets in the
//! provider's own file storage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use crate::error::ProviderError;
use crate::message::{Message, Part};

/// Configuration for one model turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The model to use (e.g., "gemini-2.0-flash")
    pub model: String,

    /// The full conversation so far
    pub messages: Vec<Message>,

    /// Optional system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the model so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A structured request from the model to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The collected result of one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnResponse {
    /// All streamed text, concatenated
    pub text: String,

    /// Tool calls in the order the model emitted them
    pub tool_calls: Vec<ToolCallRequest>,

    /// Usage info, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TurnResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls,
            ..Self::default()
        }
    }

    /// The parts to record as the model's message.
    pub fn to_parts(&self) -> Vec<Part> {
        let mut parts = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.text.is_empty() {
            parts.push(Part::text(self.text.clone()));
        }
        parts.extend(self.tool_calls.iter().map(|tc| Part::ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.arguments.clone(),
        }));
        parts
    }
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial text delta
    #[serde(default)]
    pub text: Option<String>,

    /// Complete tool calls surfaced by this chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A file held in the provider's storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider resource name (e.g., "files/abc123")
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    /// Lower-case hex SHA-256 of the content, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// One page of the provider's file listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Receiver half of a streamed turn.
pub type ChunkReceiver = mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: TurnRequest) -> std::result::Result<TurnResponse, ProviderError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a single chunk.
    async fn stream(&self, request: TurnRequest) -> std::result::Result<ChunkReceiver, ProviderError> {
        let response = self.complete(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                text: Some(response.text),
                tool_calls: response.tool_calls,
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(rx)
    }

    /// Upload a binary asset to the provider's file storage.
    async fn upload_file(
        &self,
        _data: &[u8],
        _mime_type: &str,
        display_name: &str,
    ) -> std::result::Result<RemoteFile, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Provider '{}' does not support uploads ({display_name})",
            self.name()
        )))
    }

    /// Fetch one page of the provider's uploaded files.
    async fn list_files(
        &self,
        _page_token: Option<String>,
    ) -> std::result::Result<FilePage, ProviderError> {
        Ok(FilePage::default())
    }

    /// Count the tokens the given parts would consume.
    ///
    /// Default implementation estimates 4 characters per token.
    async fn count_tokens(&self, parts: &[Part]) -> std::result::Result<u32, ProviderError> {
        let chars: usize = parts
            .iter()
            .map(|p| match p {
                Part::Text { content } => content.len(),
                Part::ToolResult { output, .. } => output.len(),
                Part::ToolCall { arguments, .. } => arguments.to_string().len(),
                Part::AttachmentRef { .. } => 0,
            })
            .sum();
        Ok((chars / 4) as u32)
    }
}

/// Drain a streamed turn into a single [`TurnResponse`].
///
/// An error chunk, or a stream that closes before its final chunk, fails the turn.
pub async fn collect_turn(mut rx: ChunkReceiver) -> std::result::Result<TurnResponse, ProviderError> {
    let mut response = TurnResponse::default();
    while let Some(chunk) = rx.recv().await {
        let chunk = chunk?;
        if let Some(text) = chunk.text {
            response.text.push_str(&text);
        }
        response.tool_calls.extend(chunk.tool_calls);
        if chunk.usage.is_some() {
            response.usage = chunk.usage;
        }
        if chunk.done {
            return Ok(response);
        }
    }
    Err(ProviderError::StreamInterrupted(
        "stream closed before the final chunk".into(),
    ))
}
