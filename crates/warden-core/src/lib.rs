//! warden-core
//!
//! Autonomous security-analysis decision engine.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, risk, context, plan, execution record, errors）
//! - **ports**: 抽象化レイヤー（LlmClient, HistoryStore, Clock, IdGenerator）
//! - **impls**: 実装（Anthropic / OpenAI クライアント、InMemoryHistory など）
//! - **plan**: action 間の依存グラフ（トポロジカル順・循環検出）
//! - **typed**: 型付き Tool API（ToolInput, ToolHandler, ToolRegistry）
//! - **tools**: builtin analyzers
//! - **app**: prompt, synthesizer, executor, engine, builder
//! - **config**: 環境変数からの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod plan;
pub mod ports;
pub mod tools;
pub mod typed;

pub use app::{AnalysisOutcome, BuildError, DecisionEngine, EngineBuilder, UserContext};
pub use config::{ConfigError, EngineConfig};
