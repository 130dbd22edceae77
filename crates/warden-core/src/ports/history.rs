//! HistoryStore port - plan と execution record の保存先
//!
//! # 設計原則
//! - bounded（容量を超えたら古いものから捨てる）
//! - plan は plan_id で引ける（approval 用の secondary index）
//! - 並行 append は実装側で同期する

use async_trait::async_trait;

use crate::domain::{DecisionPlan, ExecutionRecord, PlanId, PlanStatus};

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Record a newly created plan with status `Pending`.
    async fn record_plan(&self, plan: DecisionPlan);

    async fn find_plan(&self, plan_id: PlanId) -> Option<DecisionPlan>;

    async fn plan_status(&self, plan_id: PlanId) -> Option<PlanStatus>;

    /// Move a `Pending` plan to `status` in one step.
    ///
    /// Returns the status the plan had before the call (`None` when the plan
    /// is not retained). Plans that are already decided are left unchanged.
    async fn decide_plan(&self, plan_id: PlanId, status: PlanStatus) -> Option<PlanStatus>;

    async fn record_execution(&self, record: ExecutionRecord);

    /// Retained execution records for `user_id`, oldest first.
    async fn executions_for_user(&self, user_id: &str) -> Vec<ExecutionRecord>;

    /// Number of retained plans.
    async fn plan_count(&self) -> usize;
}
