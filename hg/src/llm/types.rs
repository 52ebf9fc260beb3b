//! LLM request/response types
//!
//! Modelled on the OpenAI Chat Completions API, reduced to what list
//! generation needs: one system prompt, plain-text messages, text output.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (the role-specific instruction)
    pub system_prompt: String,

    /// User messages (a single one for grid generation)
    pub messages: Vec<Message>,

    /// Max tokens for response (from config)
    pub max_tokens: u32,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role; grid generation only sends user turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Accumulated text content (empty if the model produced none)
    pub content: String,

    /// Why the model stopped
    pub stop_reason: StopReason,
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    /// Map an OpenAI `finish_reason` string
    pub fn from_finish_reason(reason: &str) -> Self {
        match reason {
            "length" => StopReason::MaxTokens,
            "content_filter" => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }
}

/// A piece of a streaming response
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Incremental text
    TextDelta(String),

    /// Stream finished
    MessageDone { stop_reason: StopReason },
}
