//! LLM Client module
//!
//! Provides the streaming completion abstraction and the OpenAI implementation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, StreamChunk};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Only the "openai" provider (and OpenAI-compatible endpoints reached via
/// `base-url`) is supported.
pub fn create_client(config: &LlmConfig, api_key: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config, api_key)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai",
                other
            )))
        }
    }
}
