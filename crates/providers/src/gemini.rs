//! Gemini provider implementation.
//!
//! Talks to the Generative Language REST API:
//! - `models/{model}:streamGenerateContent?alt=sse` for streamed turns
//! - `models/{model}:generateContent` for non-streaming turns
//! - `upload/v1beta/files` (multipart/related) for binary assets
//! - `files` for the paged listing of uploaded assets
//! - `models/{model}:countTokens`

use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use notewright_core::error::ProviderError;
use notewright_core::message::{Message, Part, Role};
use notewright_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

const LIST_PAGE_SIZE: u32 = 100;

pub struct GeminiProvider {
    api_url: String,
    upload_url: String,
    api_key: String,
    /// Model used for token counting
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_url: impl Into<String>,
        upload_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            upload_url: upload_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:{method}", self.api_url)
    }

    fn to_api_content(message: &Message) -> ApiContent {
        ApiContent {
            role: Some(
                match message.role {
                    Role::User => "user",
                    Role::Model => "model",
                }
                .into(),
            ),
            parts: message.parts.iter().map(Self::to_api_part).collect(),
        }
    }

    fn to_api_part(part: &Part) -> ApiPart {
        match part {
            Part::Text { content } => ApiPart {
                text: Some(content.clone()),
                ..ApiPart::default()
            },
            Part::AttachmentRef { uri, mime_type } => ApiPart {
                file_data: Some(ApiFileData {
                    mime_type: mime_type.clone(),
                    file_uri: uri.clone(),
                }),
                ..ApiPart::default()
            },
            Part::ToolCall { id, name, arguments } => ApiPart {
                function_call: Some(ApiFunctionCall {
                    id: Some(id.clone()),
                    name: name.clone(),
                    args: arguments.clone(),
                }),
                ..ApiPart::default()
            },
            Part::ToolResult { id, name, output } => ApiPart {
                function_response: Some(ApiFunctionResponse {
                    id: Some(id.clone()),
                    name: name.clone(),
                    response: serde_json::json!({ "name": name, "content": output }),
                }),
                ..ApiPart::default()
            },
        }
    }

    fn request_body(request: &TurnRequest) -> ApiRequest {
        ApiRequest {
            contents: request.messages.iter().map(Self::to_api_content).collect(),
            system_instruction: request.system_instruction.as_ref().map(|text| ApiContent {
                role: None,
                parts: vec![ApiPart {
                    text: Some(text.clone()),
                    ..ApiPart::default()
                }],
            }),
            tools: if request.tools.is_empty() {
                Vec::new()
            } else {
                vec![ApiTool {
                    function_declarations: request
                        .tools
                        .iter()
                        .map(|t| ApiFunctionDeclaration {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        })
                        .collect(),
                }]
            },
            generation_config: ApiGenerationConfig {
                temperature: request.temperature,
            },
        }
    }

    async fn send_checked(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = builder
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    match status {
        200..=299 => Ok(response),
        429 => Err(ProviderError::RateLimited {
            retry_after_secs: 5,
        }),
        401 | 403 => Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        )),
        404 => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::ModelNotFound(body))
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Provider returned error");
            Err(ProviderError::ApiError {
                status_code: status,
                message: body,
            })
        }
    }
}

/// Turn one response payload (a full response or one SSE chunk) into a stream chunk.
fn chunk_from_response(response: ApiResponse) -> Result<StreamChunk, ProviderError> {
    if let Some(error) = response.error {
        return Err(ProviderError::ApiError {
            status_code: error.code.unwrap_or(500),
            message: error.message,
        });
    }

    let mut chunk = StreamChunk::default();
    let mut text = String::new();
    for candidate in response.candidates {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                chunk.tool_calls.push(ToolCallRequest {
                    id: call
                        .id
                        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
                    name: call.name,
                    arguments: call.args,
                });
            }
        }
    }
    if !text.is_empty() {
        chunk.text = Some(text);
    }
    chunk.usage = response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });
    Ok(chunk)
}

/// Normalise the listing's `sha256Hash` to lower-case hex.
///
/// The field is base64; depending on the API revision it wraps either the raw
/// 32-byte digest or the hex digest text.
fn normalize_sha256(encoded: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    if bytes.len() == 32 {
        return Some(hex::encode(bytes));
    }
    let text = String::from_utf8(bytes).ok()?;
    if text.len() == 64 && text.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(text.to_ascii_lowercase())
    } else {
        None
    }
}

fn to_remote_file(file: ApiFile) -> RemoteFile {
    RemoteFile {
        sha256: file.sha256_hash.as_deref().and_then(normalize_sha256),
        name: file.name,
        uri: file.uri.unwrap_or_default(),
        mime_type: file.mime_type.unwrap_or_default(),
        display_name: file.display_name,
    }
}

/// Build a `multipart/related` body: JSON metadata part, then the raw bytes.
fn multipart_body(boundary: &str, display_name: &str, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let metadata = serde_json::json!({ "file": { "displayName": display_name } });
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Splits an SSE byte stream into lines.
///
/// Bytes are buffered raw and only complete lines are decoded, so a UTF-8
/// character split across network chunks survives intact.
#[derive(Default)]
struct SseLines {
    buffer: Vec<u8>,
}

impl SseLines {
    /// Feed one network chunk and take every line it completes.
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            lines.push(decode_line(&line[..end]));
        }
        lines
    }

    /// The trailing line when the stream ends without a newline.
    fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string()
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: TurnRequest) -> Result<TurnResponse, ProviderError> {
        let url = self.model_url(&request.model, "generateContent");
        let body = Self::request_body(&request);

        debug!(model = %request.model, messages = request.messages.len(), "Sending completion request");

        let response = self.send_checked(self.client.post(&url).json(&body)).await?;
        let api_response: ApiResponse = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        let chunk = chunk_from_response(api_response)?;
        Ok(TurnResponse {
            text: chunk.text.unwrap_or_default(),
            tool_calls: chunk.tool_calls,
            usage: chunk.usage,
        })
    }

    async fn stream(&self, request: TurnRequest) -> Result<ChunkReceiver, ProviderError> {
        let url = format!("{}?alt=sse", self.model_url(&request.model, "streamGenerateContent"));
        let body = Self::request_body(&request);

        debug!(model = %request.model, messages = request.messages.len(), "Sending streaming request");

        let response = self
            .send_checked(
                self.client
                    .post(&url)
                    .header("Accept", "text/event-stream")
                    .json(&body),
            )
            .await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Read the SSE byte stream and forward parsed chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = SseLines::default();
            let mut usage = None;

            let mut ended = false;
            while !ended {
                let batch = match byte_stream.next().await {
                    Some(Ok(bytes)) => lines.push(&bytes),
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                    None => {
                        ended = true;
                        lines.finish().into_iter().collect()
                    }
                };

                for line in batch {
                    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
                        continue;
                    };
                    if data.is_empty() {
                        continue;
                    }

                    let parsed = match serde_json::from_str::<ApiResponse>(data) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
                            continue;
                        }
                    };
                    match chunk_from_response(parsed) {
                        Ok(mut chunk) => {
                            if let Some(u) = chunk.usage.take() {
                                usage = Some(u);
                            }
                            if chunk.text.is_none() && chunk.tool_calls.is_empty() {
                                continue;
                            }
                            if tx.send(Ok(chunk)).await.is_err() {
                                return; // receiver dropped
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            // The API closes the connection after the last candidate
            let _ = tx
                .send(Ok(StreamChunk {
                    done: true,
                    usage,
                    ..StreamChunk::default()
                }))
                .await;
        });

        Ok(rx)
    }

    async fn upload_file(
        &self,
        data: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, ProviderError> {
        let url = format!("{}/files?uploadType=multipart", self.upload_url);
        let boundary = format!("notewright-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_body(&boundary, display_name, mime_type, data);

        debug!(display_name, mime_type, bytes = data.len(), "Uploading file");

        let response = self
            .send_checked(
                self.client
                    .post(&url)
                    .header("X-Goog-Upload-Protocol", "multipart")
                    .header(
                        "Content-Type",
                        format!("multipart/related; boundary={boundary}"),
                    )
                    .body(body),
            )
            .await?;

        let uploaded: ApiUploadResponse =
            response.json().await.map_err(|e| ProviderError::UploadFailed {
                display_name: display_name.to_string(),
                reason: format!("Failed to parse upload response: {e}"),
            })?;

        let file = to_remote_file(uploaded.file);
        if file.uri.is_empty() {
            return Err(ProviderError::UploadFailed {
                display_name: display_name.to_string(),
                reason: "upload response carried no file URI".into(),
            });
        }
        debug!(name = %file.name, uri = %file.uri, "File uploaded");
        Ok(file)
    }

    async fn list_files(&self, page_token: Option<String>) -> Result<FilePage, ProviderError> {
        let url = format!("{}/files", self.api_url);
        let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.send_checked(self.client.get(&url).query(&query)).await?;
        let page: ApiFileList = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse file listing: {e}"),
        })?;

        trace!(count = page.files.len(), more = page.next_page_token.is_some(), "File page fetched");

        Ok(FilePage {
            files: page.files.into_iter().map(to_remote_file).collect(),
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn count_tokens(&self, parts: &[Part]) -> Result<u32, ProviderError> {
        let url = self.model_url(&self.model, "countTokens");
        let body = serde_json::json!({
            "contents": [ApiContent {
                role: Some("user".into()),
                parts: parts.iter().map(Self::to_api_part).collect(),
            }]
        });

        let response = self.send_checked(self.client.post(&url).json(&body)).await?;
        let counted: ApiCountTokens = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse token count: {e}"),
        })?;
        Ok(counted.total_tokens)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_data: Option<ApiFileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiTool {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    sha256_hash: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUploadResponse {
    file: ApiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCountTokens {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            "https://example.test/v1beta/",
            "https://example.test/upload/v1beta",
            "key",
            "gemini-2.0-flash",
            30,
        )
        .unwrap()
    }

    #[test]
    fn model_urls() {
        let p = provider();
        assert_eq!(
            p.model_url("gemini-2.0-flash", "countTokens"),
            "https://example.test/v1beta/models/gemini-2.0-flash:countTokens"
        );
        assert_eq!(
            p.model_url("models/gemini-pro", "generateContent"),
            "https://example.test/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let request = TurnRequest {
            model: "gemini-2.0-flash".into(),
            messages: vec![
                Message::user(vec![
                    Part::AttachmentRef {
                        uri: "https://files/abc".into(),
                        mime_type: "audio/mpeg".into(),
                    },
                    Part::text("Summarise"),
                ]),
                Message::model(vec![Part::ToolCall {
                    id: "c1".into(),
                    name: "list".into(),
                    arguments: serde_json::json!({"rootPath": "/"}),
                }]),
                Message::user(vec![Part::tool_result("c1", "list", "/\n")]),
            ],
            system_instruction: Some("Be terse".into()),
            tools: vec![ToolDefinition {
                name: "list".into(),
                description: "List the vault".into(),
                parameters: serde_json::json!({"type": "object"}),
            }],
            temperature: 0.2,
        };

        let body = serde_json::to_value(GeminiProvider::request_body(&request)).unwrap();
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][0]["parts"][0]["fileData"]["fileUri"], "https://files/abc");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "list");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"]["content"],
            "/\n"
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be terse");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "list");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn tools_omitted_when_empty() {
        let request = TurnRequest {
            model: "m".into(),
            messages: vec![Message::user(vec![Part::text("hi")])],
            system_instruction: None,
            tools: vec![],
            temperature: 0.7,
        };
        let body = serde_json::to_value(GeminiProvider::request_body(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn parse_text_chunk() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        let chunk = chunk_from_response(serde_json::from_str(data).unwrap()).unwrap();
        assert_eq!(chunk.text.as_deref(), Some("Hello"));
        assert!(chunk.tool_calls.is_empty());
        assert!(!chunk.done);
    }

    #[test]
    fn parse_function_calls_keep_order_and_fill_ids() {
        let data = r#"{"candidates":[{"content":{"parts":[
            {"functionCall":{"name":"write","args":{"path":"a.md","content":"x"}}},
            {"functionCall":{"id":"given","name":"list","args":{}}}
        ]},"finishReason":"STOP"}]}"#;
        let chunk = chunk_from_response(serde_json::from_str(data).unwrap()).unwrap();
        assert_eq!(chunk.tool_calls.len(), 2);
        assert_eq!(chunk.tool_calls[0].name, "write");
        assert!(chunk.tool_calls[0].id.starts_with("call_"));
        assert_eq!(chunk.tool_calls[0].arguments["path"], "a.md");
        assert_eq!(chunk.tool_calls[1].id, "given");
    }

    #[test]
    fn thought_parts_are_skipped() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"hmm","thought":true},{"text":"answer"}]}}]}"#;
        let chunk = chunk_from_response(serde_json::from_str(data).unwrap()).unwrap();
        assert_eq!(chunk.text.as_deref(), Some("answer"));
    }

    #[test]
    fn parse_usage_metadata() {
        let data = r#"{"candidates":[],"usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":5,"totalTokenCount":15}}"#;
        let chunk = chunk_from_response(serde_json::from_str(data).unwrap()).unwrap();
        let usage = chunk.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 5);
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn error_payload_becomes_api_error() {
        let data = r#"{"error":{"code":503,"message":"overloaded","status":"UNAVAILABLE"}}"#;
        let err = chunk_from_response(serde_json::from_str(data).unwrap()).unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 503, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn sha256_normalisation_accepts_raw_and_hex_digests() {
        let engine = base64::engine::general_purpose::STANDARD;
        let digest = [0xabu8; 32];
        let expected = hex::encode(digest);

        assert_eq!(normalize_sha256(&engine.encode(digest)), Some(expected.clone()));
        assert_eq!(
            normalize_sha256(&engine.encode(expected.to_uppercase())),
            Some(expected)
        );
        assert_eq!(normalize_sha256("not base64!"), None);
        assert_eq!(normalize_sha256(&engine.encode("short")), None);
    }

    #[test]
    fn parse_file_listing() {
        let data = r#"{"files":[{"name":"files/a1","displayName":"talk.mp3","mimeType":"audio/mpeg",
            "sha256Hash":"q6urq6urq6urq6urq6urq6urq6urq6urq6urq6urq6s=","uri":"https://files/a1"}],
            "nextPageToken":"tok"}"#;
        let page: ApiFileList = serde_json::from_str(data).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        let file = to_remote_file(page.files.into_iter().next().unwrap());
        assert_eq!(file.uri, "https://files/a1");
        assert_eq!(file.display_name.as_deref(), Some("talk.mp3"));
        assert_eq!(file.sha256.as_deref(), Some(hex::encode([0xabu8; 32]).as_str()));
    }

    #[test]
    fn empty_listing_parses() {
        let page: ApiFileList = serde_json::from_str("{}").unwrap();
        assert!(page.files.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn multipart_body_layout() {
        let body = multipart_body("BOUND", "talk.mp3", "audio/mpeg", b"DATA");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--BOUND\r\nContent-Type: application/json"));
        assert!(text.contains(r#""displayName":"talk.mp3""#));
        assert!(text.contains("--BOUND\r\nContent-Type: audio/mpeg\r\n\r\nDATA\r\n--BOUND--\r\n"));
    }

    #[test]
    fn count_tokens_response() {
        let parsed: ApiCountTokens = serde_json::from_str(r#"{"totalTokens":42}"#).unwrap();
        assert_eq!(parsed.total_tokens, 42);
    }

    #[test]
    fn sse_lines_keep_split_characters_intact() {
        let line = "data: {\"text\":\"café 日本\"}\r\n";
        let bytes = line.as_bytes();
        // Split inside the two-byte 'é' and inside the three-byte '日'
        let e_start = line.find('é').unwrap();
        let kanji_start = line.find('日').unwrap();

        let mut lines = SseLines::default();
        assert!(lines.push(&bytes[..e_start + 1]).is_empty());
        assert!(lines.push(&bytes[e_start + 1..kanji_start + 2]).is_empty());
        let out = lines.push(&bytes[kanji_start + 2..]);
        assert_eq!(out, vec!["data: {\"text\":\"café 日本\"}".to_string()]);
        assert!(lines.finish().is_none());
    }

    #[test]
    fn sse_lines_split_many_and_keep_trailing_line() {
        let mut lines = SseLines::default();
        let out = lines.push(b"data: 1\n\ndata: 2\ndata: 3");
        assert_eq!(out, vec!["data: 1", "", "data: 2"]);
        assert_eq!(lines.finish().as_deref(), Some("data: 3"));
        assert!(lines.finish().is_none());
    }
}
