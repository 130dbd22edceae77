//! Domain model (ids, risk, context, plans, execution records, errors).
//!
//! このモジュールは I/O を持たない葉のデータ型だけを置く。

pub mod context;
pub mod errors;
pub mod execution;
pub mod ids;
pub mod plan;
pub mod risk;

pub use context::DecisionContext;
pub use errors::{EngineError, LlmError, ToolError, ToolErrorKind};
pub use execution::{DEPENDENCIES_FAILED, ExecutionRecord, ExecutionStatus};
pub use ids::{ActionId, PlanId};
pub use plan::{AgentAction, DecisionPlan, DecisionType, PlanSource, PlanStatus};
pub use risk::RiskLevel;
