//! ActionExecutor - plan の action をトポロジカル順に実行する
//!
//! # フロー
//! 1. ActionGraph を構築（未知の依存 / 循環はここで即エラー、何も実行しない）
//! 2. トポロジカル順（同順位は宣言順）に 1 つずつ実行
//! 3. 依存先のどれかが success でなければ skipped（推移的に伝播）
//! 4. 各 record は history に追記

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::domain::{
    AgentAction, DecisionContext, DecisionPlan, EngineError, ExecutionRecord, PlanId, ToolError,
    ToolErrorKind,
};
use crate::plan::ActionGraph;
use crate::ports::{Clock, HistoryStore};
use crate::typed::ToolRegistry;

pub struct ActionExecutor {
    registry: ToolRegistry,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    tool_timeout: Duration,
}

impl ActionExecutor {
    pub fn new(
        registry: ToolRegistry,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            history,
            clock,
            tool_timeout,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run every action of `plan`. Records come back in execution order.
    pub async fn execute_plan(
        &self,
        plan: &DecisionPlan,
        ctx: &DecisionContext,
    ) -> Result<Vec<ExecutionRecord>, EngineError> {
        let graph = ActionGraph::from_actions(&plan.actions)?;
        let order = graph.topological_order()?;

        info!(plan_id = %plan.plan_id, actions = order.len(), "executing plan");

        // Indexed by action position; filled as actions finish.
        let mut succeeded = vec![false; plan.actions.len()];
        let mut records = Vec::with_capacity(order.len());

        for node in order {
            let action = &plan.actions[node];
            let ready = graph.dependencies(node).all(|dep| succeeded[dep]);

            let record = if ready {
                self.execute_action(action, ctx, plan.plan_id).await
            } else {
                debug!(action_id = %action.action_id, "dependencies failed, skipping");
                let record = ExecutionRecord::skipped(
                    plan.plan_id,
                    &ctx.user_id,
                    &action.action_id,
                    &action.tool_name,
                    self.clock.now(),
                );
                self.history.record_execution(record.clone()).await;
                record
            };

            succeeded[node] = record.is_success();
            records.push(record);
        }

        Ok(records)
    }

    /// Run one action. Failures become `error` records, never `Err`.
    pub async fn execute_action(
        &self,
        action: &AgentAction,
        ctx: &DecisionContext,
        plan_id: PlanId,
    ) -> ExecutionRecord {
        debug!(action_id = %action.action_id, tool = %action.tool_name, "action started");
        let started = Instant::now();

        let outcome = match self.registry.get(&action.tool_name) {
            None => Err(ToolError::failed(format!("Unknown tool: {}", action.tool_name))),
            Some(tool) => {
                match tokio::time::timeout(
                    self.tool_timeout,
                    tool.invoke_dyn(&action.parameters, ctx),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ToolError::new(
                        ToolErrorKind::Timeout,
                        format!(
                            "{} timed out after {}s",
                            action.tool_name,
                            self.tool_timeout.as_secs_f64()
                        ),
                    )),
                }
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        let now = self.clock.now();
        let record = match outcome {
            Ok(result) => {
                info!(action_id = %action.action_id, tool = %action.tool_name, elapsed, "action succeeded");
                ExecutionRecord::success(
                    plan_id,
                    &ctx.user_id,
                    &action.action_id,
                    &action.tool_name,
                    result,
                    now,
                )
            }
            Err(e) => {
                warn!(
                    action_id = %action.action_id,
                    tool = %action.tool_name,
                    kind = ?e.kind(),
                    error = %e,
                    "action failed"
                );
                ExecutionRecord::error(
                    plan_id,
                    &ctx.user_id,
                    &action.action_id,
                    &action.tool_name,
                    e.to_string(),
                    now,
                )
            }
        }
        .with_duration(elapsed);

        self.history.record_execution(record.clone()).await;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DecisionType, ExecutionStatus, PlanSource, RiskLevel, DEPENDENCIES_FAILED};
    use crate::impls::InMemoryHistory;
    use crate::ports::SystemClock;
    use crate::tools::register_builtin_tools;
    use crate::typed::ToolInput;
    use crate::typed::handler::fixtures::{EchoHandler, SlowHandler, StrictHandler};
    use crate::typed::tool::fixtures::{EchoInput, SlowInput, StrictInput};
    use chrono::Utc;
    use serde_json::json;
    use ulid::Ulid;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register::<EchoInput, _>(EchoHandler).unwrap();
        registry.register::<StrictInput, _>(StrictHandler).unwrap();
        registry.register::<SlowInput, _>(SlowHandler).unwrap();
        registry
    }

    fn executor(history: InMemoryHistory) -> ActionExecutor {
        ActionExecutor::new(
            registry(),
            Arc::new(history),
            Arc::new(SystemClock),
            Duration::from_millis(50),
        )
    }

    fn plan(actions: Vec<AgentAction>) -> DecisionPlan {
        DecisionPlan {
            plan_id: PlanId::from_ulid(Ulid::new()),
            decision_type: DecisionType::ActionSequence,
            total_estimated_duration: 0,
            actions,
            confidence_score: 0.9,
            reasoning: String::new(),
            risk_assessment: RiskLevel::Safe,
            requires_approval: false,
            source: PlanSource::Llm,
            created_at: Utc::now(),
        }
    }

    fn ctx() -> DecisionContext {
        DecisionContext::new("u1", "p1", json!({"path": "/items"}))
    }

    fn echo(id: &str) -> AgentAction {
        AgentAction::new(id, "echo").with_parameters(json!({"value": 1}))
    }

    fn strict_failing(id: &str) -> AgentAction {
        // Missing `target`, so decoding fails.
        AgentAction::new(id, "strict")
    }

    fn summary(records: &[ExecutionRecord]) -> Vec<(String, ExecutionStatus)> {
        records
            .iter()
            .map(|r| (r.action_id.to_string(), r.status))
            .collect()
    }

    #[tokio::test]
    async fn independent_actions_run_in_declaration_order() {
        let history = InMemoryHistory::new(10);
        let records = executor(history.clone())
            .execute_plan(&plan(vec![echo("a"), echo("b")]), &ctx())
            .await
            .unwrap();

        assert_eq!(
            summary(&records),
            vec![
                ("a".to_string(), ExecutionStatus::Success),
                ("b".to_string(), ExecutionStatus::Success)
            ]
        );
        assert_eq!(records[0].result, Some(json!({"value": 1, "user": "u1"})));
        assert_eq!(history.execution_count().await, 2);
    }

    #[tokio::test]
    async fn dependency_declared_later_runs_first() {
        let records = executor(InMemoryHistory::new(10))
            .execute_plan(&plan(vec![echo("b").depends_on("a"), echo("a")]), &ctx())
            .await
            .unwrap();

        assert_eq!(
            summary(&records),
            vec![
                ("a".to_string(), ExecutionStatus::Success),
                ("b".to_string(), ExecutionStatus::Success)
            ]
        );
    }

    #[tokio::test]
    async fn failed_dependency_skips_transitively() {
        let records = executor(InMemoryHistory::new(10))
            .execute_plan(
                &plan(vec![
                    strict_failing("a"),
                    echo("b").depends_on("a"),
                    echo("c").depends_on("b"),
                    echo("d"),
                ]),
                &ctx(),
            )
            .await
            .unwrap();

        assert_eq!(
            summary(&records),
            vec![
                ("a".to_string(), ExecutionStatus::Error),
                ("b".to_string(), ExecutionStatus::Skipped),
                ("c".to_string(), ExecutionStatus::Skipped),
                ("d".to_string(), ExecutionStatus::Success),
            ]
        );
        assert_eq!(records[1].reason.as_deref(), Some(DEPENDENCIES_FAILED));
    }

    #[tokio::test]
    async fn cycle_fails_before_any_tool_runs() {
        let history = InMemoryHistory::new(10);
        let err = executor(history.clone())
            .execute_plan(
                &plan(vec![echo("x"), echo("a").depends_on("b"), echo("b").depends_on("a")]),
                &ctx(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::DependencyCycle(_)));
        assert_eq!(history.execution_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_dependency_fails_fast() {
        let err = executor(InMemoryHistory::new(10))
            .execute_plan(&plan(vec![echo("a").depends_on("ghost")]), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownDependency { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_record_and_plan_continues() {
        let records = executor(InMemoryHistory::new(10))
            .execute_plan(
                &plan(vec![AgentAction::new("a", "port_knocker"), echo("b")]),
                &ctx(),
            )
            .await
            .unwrap();

        assert_eq!(records[0].status, ExecutionStatus::Error);
        assert_eq!(records[0].error.as_deref(), Some("Unknown tool: port_knocker"));
        assert_eq!(records[1].status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let exec = executor(InMemoryHistory::new(10));
        let record = exec
            .execute_action(
                &AgentAction::new("s", SlowInput::NAME),
                &ctx(),
                PlanId::from_ulid(Ulid::new()),
            )
            .await;

        assert_eq!(record.status, ExecutionStatus::Error);
        assert!(record.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn records_carry_plan_user_and_timing() {
        let history = InMemoryHistory::new(10);
        let p = plan(vec![echo("a")]);
        let records = executor(history.clone()).execute_plan(&p, &ctx()).await.unwrap();

        let record = &records[0];
        assert_eq!(record.plan_id, p.plan_id);
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.tool, "echo");
        assert!(record.duration >= 0.0);
        assert_eq!(history.executions_for_user("u1").await, records);
    }

    #[tokio::test]
    async fn builtin_fallback_action_runs() {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry).unwrap();
        let exec = ActionExecutor::new(
            registry,
            Arc::new(InMemoryHistory::new(10)),
            Arc::new(SystemClock),
            Duration::from_secs(5),
        );

        let action = AgentAction::new("scan", "security_vulnerability_scan")
            .with_parameters(json!({"scan_type": "comprehensive"}));
        let record = exec
            .execute_action(&action, &ctx(), PlanId::from_ulid(Ulid::new()))
            .await;

        assert!(record.is_success());
        assert_eq!(record.result.unwrap()["tool"], "security_vulnerability_scan");
    }
}
