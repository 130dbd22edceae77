//! Engine configuration, read from the environment (and `.env`).

use std::time::Duration;

use crate::domain::RiskLevel;

pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown LLM backend '{0}' (valid: anthropic, claude, openai, gpt, none)")]
    UnknownBackend(String),

    #[error("{0} is required for the selected LLM backend")]
    MissingApiKey(&'static str),

    #[error("failed to build LLM client: {0}")]
    Client(#[from] crate::domain::LlmError),
}

/// Engine configuration.
///
/// Every field has a default, so an empty environment yields a working
/// offline engine (no LLM, fallback plans only).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Raw backend selector; `None` means "pick from whichever key is set".
    pub llm_backend: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub max_tokens: u32,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
    pub history_capacity: usize,
    /// Plans whose highest risk is at or above this level always need approval.
    pub approval_threshold: RiskLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            llm_backend: None,
            anthropic_api_key: None,
            openai_api_key: None,
            llm_model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            approval_threshold: RiskLevel::Medium,
        }
    }
}

impl EngineConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            llm_backend: get("WARDEN_LLM_BACKEND"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            llm_model: get("WARDEN_LLM_MODEL"),
            max_tokens: parse_or("WARDEN_MAX_TOKENS", get("WARDEN_MAX_TOKENS"), defaults.max_tokens)?,
            llm_timeout: Duration::from_secs(parse_or(
                "WARDEN_LLM_TIMEOUT_SECS",
                get("WARDEN_LLM_TIMEOUT_SECS"),
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
            tool_timeout: Duration::from_secs(parse_or(
                "WARDEN_TOOL_TIMEOUT_SECS",
                get("WARDEN_TOOL_TIMEOUT_SECS"),
                DEFAULT_TOOL_TIMEOUT_SECS,
            )?),
            history_capacity: parse_or(
                "WARDEN_HISTORY_CAPACITY",
                get("WARDEN_HISTORY_CAPACITY"),
                defaults.history_capacity,
            )?,
            approval_threshold: parse_or(
                "WARDEN_APPROVAL_THRESHOLD",
                get("WARDEN_APPROVAL_THRESHOLD"),
                defaults.approval_threshold,
            )?,
        })
    }

    /// Config with no LLM at all, whatever the environment says.
    pub fn offline(mut self) -> Self {
        self.llm_backend = Some("none".to_string());
        self
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.history_capacity, 1000);
        assert_eq!(config.approval_threshold, RiskLevel::Medium);
        assert_eq!(config.tool_timeout, Duration::from_secs(30));
        assert!(config.llm_backend.is_none());
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("WARDEN_LLM_BACKEND", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("WARDEN_MAX_TOKENS", "512"),
            ("WARDEN_HISTORY_CAPACITY", "10"),
            ("WARDEN_APPROVAL_THRESHOLD", "high"),
        ]))
        .unwrap();

        assert_eq!(config.llm_backend.as_deref(), Some("openai"));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.approval_threshold, RiskLevel::High);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config =
            EngineConfig::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "   ")])).unwrap();
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = EngineConfig::from_lookup(lookup(&[("WARDEN_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "WARDEN_MAX_TOKENS", .. }
        ));
    }

    #[test]
    fn invalid_threshold_is_an_error() {
        let err = EngineConfig::from_lookup(lookup(&[("WARDEN_APPROVAL_THRESHOLD", "EXTREME")]))
            .unwrap_err();
        assert!(err.to_string().contains("WARDEN_APPROVAL_THRESHOLD"));
    }
}
