//! Errors - エラー型と分類
//!
//! - `EngineError`: 呼び出し側に返るエラー（approval lookup, graph validation など）
//! - `LlmError`: LLM 呼び出しの失敗（synthesizer 内で fallback に変換される）
//! - `ToolError`: tool 実行の失敗（executor 内で error record に変換される）

use super::ids::{ActionId, PlanId};

/// Errors surfaced by the engine's public operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("plan not found: {0}")]
    PlanNotFound(PlanId),

    #[error("plan {0} was already {1}")]
    PlanAlreadyDecided(PlanId, &'static str),

    #[error("dependency cycle between actions: {}", format_path(.0))]
    DependencyCycle(Vec<ActionId>),

    #[error("action '{action}' depends on unknown action '{missing}'")]
    UnknownDependency { action: ActionId, missing: ActionId },

    #[error("duplicate action id '{0}'")]
    DuplicateAction(ActionId),
}

fn format_path(path: &[ActionId]) -> String {
    path.iter()
        .map(ActionId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors from an LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("empty response from {0}")]
    EmptyResponse(&'static str),

    #[error("{0}")]
    Other(String),
}

/// Classification of a tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Parameters could not be decoded into the tool's input type.
    InvalidParameters,
    /// The analyzer ran and failed.
    Failed,
    /// The analyzer did not finish within the configured timeout.
    Timeout,
}

/// Error returned by a tool invocation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    kind: ToolErrorKind,
    message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParameters, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Failed, message)
    }

    pub fn kind(&self) -> ToolErrorKind {
        self.kind
    }
}
