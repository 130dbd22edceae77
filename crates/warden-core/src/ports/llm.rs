//! LlmClient port - LLM プロバイダの抽象化
//!
//! 実装は impls/ にある（Anthropic, OpenAI, Scripted）。

use async_trait::async_trait;

use crate::domain::LlmError;

/// Unified interface for a text-completion LLM provider.
///
/// One non-streaming request per call. No retries at this layer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as a single user message and return the raw text reply.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;

    fn provider_name(&self) -> &str;
}
