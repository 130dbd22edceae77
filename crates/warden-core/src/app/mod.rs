//! App - アプリケーション層
//!
//! ports と tools を組み合わせて decision engine を実装する。
//!
//! # 主要コンポーネント
//! - **prompt**: DecisionContext → planner 用の指示文（純粋関数）
//! - **PlanSynthesizer**: LLM で plan を作る、失敗時は fallback plan
//! - **ActionExecutor**: plan をトポロジカル順に実行し record を残す
//! - **DecisionEngine**: risk gate、approval、summary、analytics
//! - **EngineBuilder**: ワイヤリングと起動時検証

pub mod analytics;
pub mod builder;
pub mod engine;
pub mod executor;
pub mod prompt;
pub mod summary;
pub mod synthesizer;

// 主要な型を再エクスポート
pub use self::analytics::{ExecutionAnalytics, ToolUsage};
pub use self::builder::{BuildError, EngineBuilder};
pub use self::engine::{AnalysisOutcome, DecisionEngine, UserContext};
pub use self::executor::ActionExecutor;
pub use self::prompt::{DecisionPrompt, build_decision_prompt};
pub use self::summary::{ActionPreview, DecisionSummary};
pub use self::synthesizer::{PlanParseError, PlanSynthesizer, parse_plan_response};
