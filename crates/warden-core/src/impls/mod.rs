//! Impls - ports の実装
//!
//! - LLM: AnthropicClient, OpenAiClient（reqwest）、ScriptedLlmClient（テスト/offline）
//! - 履歴: InMemoryHistory（bounded ring buffer + plan index）

pub mod anthropic;
pub mod backend;
pub mod inmem_history;
pub mod openai;
pub mod scripted_llm;

pub use self::anthropic::AnthropicClient;
pub use self::backend::LlmBackend;
pub use self::inmem_history::InMemoryHistory;
pub use self::openai::OpenAiClient;
pub use self::scripted_llm::ScriptedLlmClient;
