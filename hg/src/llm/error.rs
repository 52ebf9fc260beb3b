//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Check if the service rejected the credential
    pub fn is_auth(&self) -> bool {
        matches!(self, LlmError::ApiError { status: 401 | 403, .. })
    }

    /// Human-readable message suitable for the status line
    ///
    /// API error bodies are JSON envelopes; when the service supplied an
    /// `error.message`, surface only that.
    pub fn user_message(&self) -> String {
        match self {
            LlmError::ApiError { status, message } => {
                let detail = serde_json::from_str::<serde_json::Value>(message)
                    .ok()
                    .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                    .unwrap_or_else(|| message.clone());
                format!("API error {}: {}", status, detail)
            }
            other => other.to_string(),
        }
    }
}
