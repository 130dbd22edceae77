//! Backend selection: which LLM provider (if any) the synthesizer talks to.

use std::str::FromStr;
use std::sync::Arc;

use crate::config::{ConfigError, EngineConfig};
use crate::ports::LlmClient;

use super::{AnthropicClient, OpenAiClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
    /// No LLM: every plan is the fallback plan.
    None,
}

impl LlmBackend {
    /// Resolve the backend from config.
    ///
    /// An explicit `WARDEN_LLM_BACKEND` wins. Otherwise the first provider with
    /// an API key is used (Anthropic, then OpenAI), else `None`.
    pub fn resolve(config: &EngineConfig) -> Result<Self, ConfigError> {
        match config.llm_backend.as_deref() {
            Some(raw) => raw.parse(),
            None if config.anthropic_api_key.is_some() => Ok(LlmBackend::Anthropic),
            None if config.openai_api_key.is_some() => Ok(LlmBackend::OpenAi),
            None => Ok(LlmBackend::None),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "Anthropic",
            LlmBackend::OpenAi => "OpenAI",
            LlmBackend::None => "none",
        }
    }

    /// Build the client for this backend.
    pub fn build_client(
        self,
        config: &EngineConfig,
    ) -> Result<Option<Arc<dyn LlmClient>>, ConfigError> {
        match self {
            LlmBackend::Anthropic => {
                let key = config
                    .anthropic_api_key
                    .clone()
                    .ok_or(ConfigError::MissingApiKey("ANTHROPIC_API_KEY"))?;
                let client = AnthropicClient::new(key, config.llm_model.clone(), config.llm_timeout)?;
                Ok(Some(Arc::new(client)))
            }
            LlmBackend::OpenAi => {
                let key = config
                    .openai_api_key
                    .clone()
                    .ok_or(ConfigError::MissingApiKey("OPENAI_API_KEY"))?;
                let client = OpenAiClient::new(key, config.llm_model.clone(), config.llm_timeout)?;
                Ok(Some(Arc::new(client)))
            }
            LlmBackend::None => Ok(None),
        }
    }
}

impl FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" | "gpt" => Ok(LlmBackend::OpenAi),
            "none" | "off" | "offline" => Ok(LlmBackend::None),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
