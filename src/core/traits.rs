use async_trait::async_trait;

use super::{error::LlmError, types::Completion};
use crate::provider::stream::FragmentStream;

/// A remote text-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One blocking request. Never fails: every problem becomes a
    /// [`Completion`] variant.
    async fn chat(&self, query: &str) -> Completion;

    /// Opens a streaming request. Connection failures come back as `Err`;
    /// the returned stream is single-pass and yields fragments in arrival order.
    async fn chat_stream(&self, query: &str) -> Result<FragmentStream, LlmError>;
}
