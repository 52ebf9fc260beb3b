//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CompletionRequest, CompletionResponse, LlmError, StreamChunk};

/// Stateless LLM client - each call is independent (fresh context)
///
/// Grid generation only ever needs streaming completions: every list request
/// is a fresh two-message conversation whose text arrives incrementally.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Streaming completion
    ///
    /// Sends chunks to the provided channel as they arrive.
    /// Returns the final complete response.
    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError>;
}
