//! List adapter: one streaming request in, exactly N strings out

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, StreamChunk};

/// Chunk channel capacity for a single list request
const CHUNK_CHANNEL_CAPACITY: usize = 256;

/// Errors surfaced by grid generation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No API key from flag, store or environment
    #[error("No API key configured. Run `hg key set <KEY>` or set {env_var}")]
    MissingCredential { env_var: String },

    /// Local input rejected before any request
    #[error("{0}")]
    Validation(String),

    /// The request could not be completed
    #[error("{0}")]
    Transport(String),

    /// The response was not the expected JSON array
    #[error("Could not parse model response: {0}")]
    Parse(String),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        if err.is_auth() {
            return GenerationError::Transport(format!("{}. {}", err.user_message(), AUTH_HINT));
        }
        GenerationError::Transport(err.user_message())
    }
}

/// Appended when the service rejects the credential
const AUTH_HINT: &str = "Check the key with `hg key status` or replace it with `hg key set <KEY>`";

/// Issue one streaming request and parse the full buffer as a list
///
/// Fragments are concatenated as they arrive; parsing happens only after the
/// stream ends.
pub async fn request_list(
    client: &Arc<dyn LlmClient>,
    system: &str,
    user: &str,
    max_tokens: u32,
    expected: usize,
) -> Result<Vec<String>, GenerationError> {
    debug!(user_len = user.len(), expected, "request_list: called");
    let request = CompletionRequest {
        system_prompt: system.to_string(),
        messages: vec![Message::user(user)],
        max_tokens,
    };

    let (tx, mut rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

    let collect = async {
        let mut buffer = String::new();
        while let Some(chunk) = rx.recv().await {
            match chunk {
                StreamChunk::TextDelta(text) => buffer.push_str(&text),
                StreamChunk::MessageDone { stop_reason } => {
                    debug!(?stop_reason, "request_list: stream finished");
                }
            }
        }
        buffer
    };

    let (result, buffer) = tokio::join!(client.stream(request, tx), collect);
    let response = result?;

    let text = if buffer.is_empty() && !response.content.is_empty() {
        warn!("request_list: no streamed fragments, using final content");
        response.content
    } else {
        buffer
    };

    parse_list(&text, expected)
}

/// Parse `text` as a JSON array of exactly `expected` non-empty strings
///
/// A Markdown code fence around the array is tolerated. Items are trimmed.
pub fn parse_list(text: &str, expected: usize) -> Result<Vec<String>, GenerationError> {
    debug!(text_len = text.len(), expected, "parse_list: called");
    let body = strip_code_fence(text.trim());

    let items: Vec<String> = serde_json::from_str(body).map_err(|e| {
        debug!(error = %e, "parse_list: not a JSON array of strings");
        GenerationError::Parse(format!("expected a JSON array of strings ({})", e))
    })?;

    if items.len() != expected {
        return Err(GenerationError::Parse(format!(
            "expected {} items, got {}",
            expected,
            items.len()
        )));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let item = item.trim().to_string();
            if item.is_empty() {
                Err(GenerationError::Parse(format!("item {} is empty", i + 1)))
            } else {
                Ok(item)
            }
        })
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
