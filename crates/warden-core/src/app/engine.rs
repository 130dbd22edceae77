//! DecisionEngine - synthesizer + risk gate + executor + history をまとめた表面
//!
//! # Risk gate
//! - `auto_execute && !plan.requires_approval` → その場で実行
//! - それ以外 → `AwaitingApproval` を返し、`approve_plan` / `reject_plan` を待つ
//!
//! plan の状態遷移は Pending → Executed | Rejected の一度きり（history 側で原子的に行う）。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::analytics::ExecutionAnalytics;
use super::executor::ActionExecutor;
use super::summary::DecisionSummary;
use super::synthesizer::PlanSynthesizer;
use crate::domain::{
    DecisionContext, DecisionPlan, DecisionType, EngineError, ExecutionRecord, ExecutionStatus,
    PlanId, PlanStatus,
};
use crate::ports::HistoryStore;

/// Caller identity and preferences for one analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub project_id: String,
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub historical_data: Vec<serde_json::Value>,
    #[serde(default)]
    pub current_findings: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub business_context: Option<String>,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Build the per-request context the planner and tools see.
    pub fn to_decision_context(
        &self,
        endpoint_data: serde_json::Value,
        available_tools: Vec<String>,
    ) -> DecisionContext {
        DecisionContext {
            user_id: self.user_id.clone(),
            project_id: self.project_id.clone(),
            endpoint_data,
            historical_data: self.historical_data.clone(),
            user_preferences: self.preferences.clone(),
            available_tools,
            current_findings: self.current_findings.clone(),
            business_context: self.business_context.clone(),
        }
    }
}

/// Result of `autonomous_security_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Executed {
        plan_id: PlanId,
        summary: DecisionSummary,
        results: Vec<ExecutionRecord>,
        success_count: usize,
        error_count: usize,
        skipped_count: usize,
    },
    AwaitingApproval {
        plan_id: PlanId,
        summary: DecisionSummary,
        message: String,
    },
}

impl AnalysisOutcome {
    pub fn plan_id(&self) -> PlanId {
        match self {
            AnalysisOutcome::Executed { plan_id, .. }
            | AnalysisOutcome::AwaitingApproval { plan_id, .. } => *plan_id,
        }
    }

    fn executed(summary: DecisionSummary, results: Vec<ExecutionRecord>) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        AnalysisOutcome::Executed {
            plan_id: summary.plan_id,
            success_count: count(ExecutionStatus::Success),
            error_count: count(ExecutionStatus::Error),
            skipped_count: count(ExecutionStatus::Skipped),
            summary,
            results,
        }
    }
}

pub struct DecisionEngine {
    synthesizer: PlanSynthesizer,
    executor: ActionExecutor,
    history: Arc<dyn HistoryStore>,
}

impl DecisionEngine {
    pub(crate) fn new(
        synthesizer: PlanSynthesizer,
        executor: ActionExecutor,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            synthesizer,
            executor,
            history,
        }
    }

    /// Registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        self.executor.registry().names()
    }

    /// `(name, description)` of every registered tool.
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.executor.registry().descriptions()
    }

    pub fn has_llm(&self) -> bool {
        self.synthesizer.has_llm()
    }

    /// Plan an analysis of `endpoint_data` and run it if the risk gate allows.
    #[instrument(skip(self, endpoint_data, user), fields(user_id = %user.user_id, project_id = %user.project_id))]
    pub async fn autonomous_security_analysis(
        &self,
        endpoint_data: serde_json::Value,
        user: &UserContext,
        auto_execute: bool,
    ) -> Result<AnalysisOutcome, EngineError> {
        let ctx = user.to_decision_context(endpoint_data, self.tool_names());
        let plan = self
            .synthesizer
            .create_decision_plan(&ctx, DecisionType::AnalysisPlan)
            .await;
        let summary = DecisionSummary::of(&plan);

        if auto_execute && !plan.requires_approval {
            let plan = self.claim(plan.plan_id, PlanStatus::Executed).await?;
            let results = self.executor.execute_plan(&plan, &ctx).await?;
            return Ok(AnalysisOutcome::executed(summary, results));
        }

        let message = if auto_execute {
            format!(
                "Plan requires approval (risk {}); approve plan {} to execute it",
                plan.max_risk(),
                plan.plan_id
            )
        } else {
            format!("Auto-execution disabled; approve plan {} to execute it", plan.plan_id)
        };
        info!(plan_id = %plan.plan_id, "plan awaiting approval");
        Ok(AnalysisOutcome::AwaitingApproval {
            plan_id: plan.plan_id,
            summary,
            message,
        })
    }

    pub async fn create_decision_plan(
        &self,
        ctx: &DecisionContext,
        decision_type: DecisionType,
    ) -> DecisionPlan {
        self.synthesizer.create_decision_plan(ctx, decision_type).await
    }

    pub async fn execute_plan(
        &self,
        plan: &DecisionPlan,
        ctx: &DecisionContext,
    ) -> Result<Vec<ExecutionRecord>, EngineError> {
        self.executor.execute_plan(plan, ctx).await
    }

    /// Execute a pending plan on behalf of a human approver.
    #[instrument(skip_all, fields(plan_id = %plan_id))]
    pub async fn approve_plan(
        &self,
        plan_id: PlanId,
        ctx: &DecisionContext,
    ) -> Result<Vec<ExecutionRecord>, EngineError> {
        let plan = self.claim(plan_id, PlanStatus::Executed).await?;
        info!("plan approved");
        self.executor.execute_plan(&plan, ctx).await
    }

    #[instrument(skip_all, fields(plan_id = %plan_id))]
    pub async fn reject_plan(&self, plan_id: PlanId) -> Result<(), EngineError> {
        self.claim(plan_id, PlanStatus::Rejected).await?;
        info!("plan rejected");
        Ok(())
    }

    pub async fn get_plan(&self, plan_id: PlanId) -> Option<DecisionPlan> {
        self.history.find_plan(plan_id).await
    }

    pub async fn plan_status(&self, plan_id: PlanId) -> Option<PlanStatus> {
        self.history.plan_status(plan_id).await
    }

    pub fn get_decision_summary(&self, plan: &DecisionPlan) -> DecisionSummary {
        DecisionSummary::of(plan)
    }

    pub async fn get_execution_analytics(&self, user_id: &str) -> ExecutionAnalytics {
        let records = self.history.executions_for_user(user_id).await;
        ExecutionAnalytics::from_records(user_id, &records)
    }

    /// Move a pending plan to `status` and return it.
    async fn claim(&self, plan_id: PlanId, status: PlanStatus) -> Result<DecisionPlan, EngineError> {
        match self.history.decide_plan(plan_id, status).await {
            None => Err(EngineError::PlanNotFound(plan_id)),
            Some(PlanStatus::Pending) => self
                .history
                .find_plan(plan_id)
                .await
                .ok_or(EngineError::PlanNotFound(plan_id)),
            Some(previous) => {
                warn!(plan_id = %plan_id, previous = previous.as_str(), "plan already decided");
                Err(EngineError::PlanAlreadyDecided(plan_id, previous.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::builder::EngineBuilder;
    use crate::domain::{PlanSource, RiskLevel};
    use crate::impls::{InMemoryHistory, ScriptedLlmClient};
    use crate::ports::LlmClient;
    use serde_json::json;
    use ulid::Ulid;

    fn endpoint() -> serde_json::Value {
        json!({
            "method": "POST",
            "url": "http://api.example.com/login",
            "parameters": [{"name": "username", "in": "body"}]
        })
    }

    fn offline_engine(history: InMemoryHistory) -> DecisionEngine {
        EngineBuilder::new()
            .with_builtin_tools()
            .unwrap()
            .history(Arc::new(history))
            .build()
            .unwrap()
    }

    fn llm_engine(llm: ScriptedLlmClient) -> DecisionEngine {
        EngineBuilder::new()
            .with_builtin_tools()
            .unwrap()
            .llm_client(Arc::new(llm) as Arc<dyn LlmClient>)
            .build()
            .unwrap()
    }

    fn safe_llm_plan() -> String {
        json!({
            "reasoning": "auth first, then scan",
            "confidence_score": 0.9,
            "risk_assessment": "SAFE",
            "requires_approval": false,
            "actions": [
                {"action_id": "auth", "tool_name": "authentication_analysis", "risk_level": "SAFE"},
                {"action_id": "scan", "tool_name": "security_vulnerability_scan",
                 "parameters": {"scan_type": "quick"}, "risk_level": "LOW",
                 "depends_on": ["auth"]},
                {"action_id": "mystery", "tool_name": "port_knocker", "risk_level": "SAFE"}
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn offline_analysis_awaits_approval_even_with_auto_execute() {
        let engine = offline_engine(InMemoryHistory::new(10));
        let outcome = engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), true)
            .await
            .unwrap();

        let AnalysisOutcome::AwaitingApproval { plan_id, summary, .. } = outcome else {
            panic!("expected awaiting approval");
        };
        assert_eq!(summary.total_actions, 1);
        assert_eq!(summary.source, PlanSource::Fallback);
        assert_eq!(engine.plan_status(plan_id).await, Some(PlanStatus::Pending));
    }

    #[tokio::test]
    async fn safe_llm_plan_auto_executes() {
        let engine = llm_engine(ScriptedLlmClient::new().reply(safe_llm_plan()));
        let outcome = engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), true)
            .await
            .unwrap();

        let AnalysisOutcome::Executed {
            plan_id,
            results,
            success_count,
            error_count,
            skipped_count,
            ..
        } = outcome
        else {
            panic!("expected executed");
        };
        assert_eq!(results.len(), 3);
        assert_eq!((success_count, error_count, skipped_count), (2, 1, 0));
        assert_eq!(results[2].error.as_deref(), Some("Unknown tool: port_knocker"));
        assert_eq!(engine.plan_status(plan_id).await, Some(PlanStatus::Executed));
    }

    #[tokio::test]
    async fn auto_execute_off_always_waits() {
        let engine = llm_engine(ScriptedLlmClient::new().reply(safe_llm_plan()));
        let outcome = engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), false)
            .await
            .unwrap();
        assert!(matches!(outcome, AnalysisOutcome::AwaitingApproval { .. }));
    }

    #[tokio::test]
    async fn approve_executes_once() {
        let engine = offline_engine(InMemoryHistory::new(10));
        let user = UserContext::new("u1", "p1");
        let outcome = engine
            .autonomous_security_analysis(endpoint(), &user, false)
            .await
            .unwrap();
        let plan_id = outcome.plan_id();
        let ctx = user.to_decision_context(endpoint(), engine.tool_names());

        let records = engine.approve_plan(plan_id, &ctx).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_success());

        let again = engine.approve_plan(plan_id, &ctx).await.unwrap_err();
        assert!(matches!(again, EngineError::PlanAlreadyDecided(id, "executed") if id == plan_id));
    }

    #[tokio::test]
    async fn approve_unknown_plan_is_not_found() {
        let engine = offline_engine(InMemoryHistory::new(10));
        let missing = PlanId::from_ulid(Ulid::new());
        let ctx = UserContext::new("u1", "p1").to_decision_context(json!({}), vec![]);

        let err = engine.approve_plan(missing, &ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::PlanNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn rejected_plan_cannot_be_approved() {
        let engine = offline_engine(InMemoryHistory::new(10));
        let user = UserContext::new("u1", "p1");
        let plan_id = engine
            .autonomous_security_analysis(endpoint(), &user, false)
            .await
            .unwrap()
            .plan_id();

        engine.reject_plan(plan_id).await.unwrap();
        let ctx = user.to_decision_context(endpoint(), engine.tool_names());
        let err = engine.approve_plan(plan_id, &ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::PlanAlreadyDecided(_, "rejected")));
        assert!(matches!(
            engine.get_execution_analytics("u1").await,
            ExecutionAnalytics::NoHistory { .. }
        ));
    }

    #[tokio::test]
    async fn evicted_plan_is_not_found() {
        let engine = offline_engine(InMemoryHistory::new(1));
        let user = UserContext::new("u1", "p1");

        let first = engine
            .autonomous_security_analysis(endpoint(), &user, false)
            .await
            .unwrap()
            .plan_id();
        engine
            .autonomous_security_analysis(endpoint(), &user, false)
            .await
            .unwrap();

        assert!(engine.get_plan(first).await.is_none());
        assert!(matches!(
            engine.reject_plan(first).await,
            Err(EngineError::PlanNotFound(_))
        ));
    }

    #[tokio::test]
    async fn analytics_follow_executions() {
        let engine = llm_engine(ScriptedLlmClient::new().reply(safe_llm_plan()));
        assert!(matches!(
            engine.get_execution_analytics("u1").await,
            ExecutionAnalytics::NoHistory { .. }
        ));

        engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), true)
            .await
            .unwrap();

        let ExecutionAnalytics::Summary {
            total_autonomous_actions,
            successful_actions,
            time_saved_minutes,
            success_rate,
            ..
        } = engine.get_execution_analytics("u1").await
        else {
            panic!("expected summary");
        };
        assert_eq!(total_autonomous_actions, 3);
        assert_eq!(successful_actions, 2);
        assert_eq!(time_saved_minutes, 10);
        assert!((success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(matches!(
            engine.get_execution_analytics("someone-else").await,
            ExecutionAnalytics::NoHistory { .. }
        ));
    }

    #[tokio::test]
    async fn summary_of_recorded_plan() {
        let engine = offline_engine(InMemoryHistory::new(10));
        let plan_id = engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), false)
            .await
            .unwrap()
            .plan_id();

        let plan = engine.get_plan(plan_id).await.unwrap();
        let summary = engine.get_decision_summary(&plan);
        assert_eq!(summary.total_actions, plan.actions.len());
        assert_eq!(summary.risk_assessment, RiskLevel::Safe);
        assert!(summary.requires_approval);
    }

    #[tokio::test]
    async fn planner_sees_registered_tools() {
        let llm = Arc::new(ScriptedLlmClient::new().reply(safe_llm_plan()));
        let engine = EngineBuilder::new()
            .with_builtin_tools()
            .unwrap()
            .llm_client(llm.clone() as Arc<dyn LlmClient>)
            .build()
            .unwrap();

        engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), false)
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        for tool in engine.tool_names() {
            assert!(prompt.contains(&tool));
        }
    }

    /// Accepts plans but never retains them.
    struct ForgetfulHistory(InMemoryHistory);

    #[async_trait::async_trait]
    impl HistoryStore for ForgetfulHistory {
        async fn record_plan(&self, _plan: DecisionPlan) {}

        async fn find_plan(&self, plan_id: PlanId) -> Option<DecisionPlan> {
            self.0.find_plan(plan_id).await
        }

        async fn plan_status(&self, plan_id: PlanId) -> Option<PlanStatus> {
            self.0.plan_status(plan_id).await
        }

        async fn decide_plan(&self, plan_id: PlanId, status: PlanStatus) -> Option<PlanStatus> {
            self.0.decide_plan(plan_id, status).await
        }

        async fn record_execution(&self, record: ExecutionRecord) {
            self.0.record_execution(record).await
        }

        async fn executions_for_user(&self, user_id: &str) -> Vec<ExecutionRecord> {
            self.0.executions_for_user(user_id).await
        }

        async fn plan_count(&self) -> usize {
            self.0.plan_count().await
        }
    }

    #[tokio::test]
    async fn auto_execute_requires_a_retained_plan() {
        let history = Arc::new(ForgetfulHistory(InMemoryHistory::new(10)));
        let engine = EngineBuilder::new()
            .with_builtin_tools()
            .unwrap()
            .history(history.clone() as Arc<dyn HistoryStore>)
            .llm_client(
                Arc::new(ScriptedLlmClient::new().reply(safe_llm_plan())) as Arc<dyn LlmClient>
            )
            .build()
            .unwrap();

        let result = engine
            .autonomous_security_analysis(endpoint(), &UserContext::new("u1", "p1"), true)
            .await;

        assert!(matches!(result, Err(EngineError::PlanNotFound(_))));
        assert!(history.executions_for_user("u1").await.is_empty());
    }
}
