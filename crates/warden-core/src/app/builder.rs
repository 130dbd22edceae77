//! EngineBuilder - DecisionEngine の構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - `expect_tools()` で必要な tool 名を宣言
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す（planner が存在しない tool を選ぶ前に気付ける）

use std::sync::Arc;

use tracing::info;

use super::engine::DecisionEngine;
use super::executor::ActionExecutor;
use super::synthesizer::PlanSynthesizer;
use crate::config::{ConfigError, EngineConfig};
use crate::impls::{InMemoryHistory, LlmBackend};
use crate::ports::{Clock, HistoryStore, IdGenerator, LlmClient, SystemClock, UlidGenerator};
use crate::tools::register_builtin_tools;
use crate::typed::{RegistryError, ToolHandler, ToolInput, ToolRegistry};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing tools: {0:?}. These tools were expected but not registered.")]
    MissingTools(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds a [`DecisionEngine`].
///
/// ```ignore
/// let engine = EngineBuilder::from_config(EngineConfig::from_env()?)?
///     .with_builtin_tools()?
///     .expect_tools(&["security_vulnerability_scan"])
///     .build()?;
/// ```
///
/// Unset ports default to `SystemClock`, `UlidGenerator` and an
/// `InMemoryHistory` sized by the config; no LLM client means fallback plans only.
pub struct EngineBuilder {
    registry: ToolRegistry,
    expected_tools: Option<Vec<String>>,
    config: EngineConfig,
    llm: Option<Arc<dyn LlmClient>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
            expected_tools: None,
            config: EngineConfig::default(),
            llm: None,
            clock: None,
            ids: None,
            history: None,
        }
    }

    /// Builder with `config` applied and the LLM client it selects.
    pub fn from_config(config: EngineConfig) -> Result<Self, BuildError> {
        let backend = LlmBackend::resolve(&config)?;
        let llm = backend.build_client(&config)?;
        info!(backend = backend.name(), "LLM backend selected");

        let mut builder = Self::new().config(config);
        builder.llm = llm;
        Ok(builder)
    }

    pub fn register<T: ToolInput, H: ToolHandler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    pub fn with_builtin_tools(mut self) -> Result<Self, RegistryError> {
        register_builtin_tools(&mut self.registry)?;
        Ok(self)
    }

    pub fn expect_tools(mut self, tools: &[&str]) -> Self {
        self.expected_tools = Some(tools.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn llm_client(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn build(self) -> Result<DecisionEngine, BuildError> {
        if let Some(expected) = &self.expected_tools {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !self.registry.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTools(missing));
            }
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())) as Arc<dyn IdGenerator>);
        let history_capacity = self.config.history_capacity;
        let history = self.history.unwrap_or_else(|| {
            Arc::new(InMemoryHistory::new(history_capacity)) as Arc<dyn HistoryStore>
        });

        let synthesizer = PlanSynthesizer::new(
            self.llm,
            history.clone(),
            clock.clone(),
            ids,
            self.config.max_tokens,
            self.config.approval_threshold,
        );
        let executor = ActionExecutor::new(
            self.registry,
            history.clone(),
            clock,
            self.config.tool_timeout,
        );
        Ok(DecisionEngine::new(synthesizer, executor, history))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
