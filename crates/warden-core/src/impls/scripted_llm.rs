//! ScriptedLlmClient - ネットワークなしで LLM を差し替える
//!
//! 事前に積んだ応答（テキスト or エラー）を順番に返す。
//! テストと offline デモ用。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::LlmError;
use crate::ports::LlmClient;

enum Scripted {
    Reply(String),
    Fail(String),
}

/// Replays queued replies in order. An exhausted script is an error.
#[derive(Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Scripted::Reply(text.into()));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn push(&self, item: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self
            .script
            .lock()
            .map_err(|_| LlmError::Other("script lock poisoned".to_string()))?
            .pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(LlmError::Other(message)),
            None => Err(LlmError::Other("script exhausted".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "Scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_errors() {
        let llm = ScriptedLlmClient::new().reply("one").fail("boom");

        assert_eq!(llm.complete("p1", 10).await.unwrap(), "one");
        assert_eq!(llm.complete("p2", 10).await.unwrap_err().to_string(), "boom");
        assert!(llm.complete("p3", 10).await.is_err());
        assert_eq!(llm.prompts(), vec!["p1", "p2", "p3"]);
    }
}
