//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API using
//! server-sent-event streaming.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, StreamChunk};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    reasoning_effort: Option<String>,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration and a resolved credential
    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        let reasoning_effort = Some(config.reasoning_effort.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Self {
            model: config.model.clone(),
            reasoning_effort,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        }));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(effort) = &self.reasoning_effort {
            debug!(%effort, "build_request_body: adding reasoning effort");
            body["reasoning_effort"] = serde_json::json!(effort);
        }

        body
    }
}

/// One decoded server-sent-event line
#[derive(Debug, PartialEq)]
enum SseLine {
    /// Content delta and/or finish reason
    Delta {
        content: Option<String>,
        finish_reason: Option<String>,
    },
    /// Terminal `[DONE]` marker
    Done,
    /// In-stream error envelope
    Error(String),
    /// Blank line, comment, or a payload without choices
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return SseLine::Done;
    }

    let chunk = match serde_json::from_str::<OpenAIStreamChunk>(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!(error = %e, "parse_sse_line: undecodable stream payload");
            return SseLine::Skip;
        }
    };

    if let Some(err) = chunk.error {
        return SseLine::Error(err.message);
    }

    match chunk.choices.into_iter().next() {
        Some(choice) => SseLine::Delta {
            content: choice.delta.content,
            finish_reason: choice.finish_reason,
        },
        None => SseLine::Skip,
    }
}

/// Splits a byte stream into complete UTF-8 lines
///
/// Bytes are held until their newline arrives, so a character split across
/// network chunks is decoded whole.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line, without its terminator
    fn next_line(&mut self) -> Option<Result<String, LlmError>> {
        let end = self.bytes.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.bytes.drain(..=end).collect();
        line.pop();
        Some(String::from_utf8(line).map_err(|e| LlmError::InvalidResponse(format!("stream is not valid UTF-8: {}", e))))
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "stream: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(LlmError::Network)?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("stream: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "stream: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let mut stream = response.bytes_stream();
        let mut full_content = String::new();
        let mut stop_reason = StopReason::EndTurn;
        let mut buffer = LineBuffer::default();

        'outer: while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(LlmError::Network)?;
            buffer.push(&chunk);

            // Process complete SSE lines
            while let Some(line) = buffer.next_line() {
                match parse_sse_line(&line?) {
                    SseLine::Delta { content, finish_reason } => {
                        if let Some(content) = content {
                            full_content.push_str(&content);
                            let _ = chunk_tx.send(StreamChunk::TextDelta(content)).await;
                        }
                        if let Some(reason) = finish_reason {
                            stop_reason = StopReason::from_finish_reason(&reason);
                        }
                    }
                    SseLine::Done => {
                        debug!("stream: received [DONE]");
                        break 'outer;
                    }
                    SseLine::Error(message) => {
                        debug!(%message, "stream: error in stream");
                        return Err(LlmError::ApiError { status, message });
                    }
                    SseLine::Skip => {}
                }
            }
        }

        if stop_reason == StopReason::MaxTokens {
            warn!(content_len = full_content.len(), "stream: response truncated at max tokens");
        }

        let _ = chunk_tx
            .send(StreamChunk::MessageDone {
                stop_reason: stop_reason.clone(),
            })
            .await;

        Ok(CompletionResponse {
            content: full_content,
            stop_reason,
        })
    }
}

// Streaming types

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    error: Option<OpenAIStreamError>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamError {
    message: String,
}
