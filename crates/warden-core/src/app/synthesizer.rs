//! PlanSynthesizer - LLM に plan を作らせ、駄目なら fallback plan を返す
//!
//! # 失敗の扱い
//! - LLM 未設定 / 通信失敗 / JSON 不正 / グラフ不正 → すべて fallback plan
//! - `create_decision_plan` 自体は決して失敗しない
//! - 作った plan は必ず history に Pending で記録する

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::domain::plan::{clamp_confidence, total_duration};
use crate::domain::{
    AgentAction, DecisionContext, DecisionPlan, DecisionType, EngineError, LlmError, PlanSource,
    RiskLevel,
};
use crate::plan::execution_order;
use crate::ports::{Clock, HistoryStore, IdGenerator, LlmClient};
use crate::tools::{ScanType, VulnerabilityScan};
use crate::typed::ToolInput;

use super::prompt::build_decision_prompt;

const FALLBACK_CONFIDENCE: f64 = 0.5;
const DEFAULT_ACTION_DURATION: u64 = 60;

/// Why an LLM response was not turned into a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanParseError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("malformed plan JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan has no actions")]
    NoActions,

    #[error("invalid plan structure: {0}")]
    Graph(#[from] EngineError),
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    reasoning: String,
    confidence_score: Option<f64>,
    risk_assessment: Option<String>,
    requires_approval: Option<bool>,
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action_id: LooseId,
    tool_name: String,
    #[serde(default)]
    parameters: serde_json::Value,
    risk_level: Option<String>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    expected_outcome: String,
    #[serde(default, deserialize_with = "loose_duration")]
    estimated_duration: Option<u64>,
    #[serde(default)]
    depends_on: Vec<LooseId>,
}

/// Models sometimes number their actions (`"action_id": 1`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseId {
    Text(String),
    Number(serde_json::Number),
}

impl From<LooseId> for String {
    fn from(id: LooseId) -> Self {
        match id {
            LooseId::Text(s) => s,
            LooseId::Number(n) => n.to_string(),
        }
    }
}

/// Seconds as integer, float or numeric string. Floats are rounded and
/// clamped to `0..=u64::MAX`; anything unreadable falls back to the default.
fn loose_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let seconds = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(round_seconds)),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(round_seconds),
        _ => None,
    };
    Ok(seconds)
}

fn round_seconds(seconds: f64) -> u64 {
    // `as` saturates; NaN becomes 0.
    seconds.round() as u64
}

/// Everything about a plan except the id and timestamp, which the engine owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlan {
    pub actions: Vec<AgentAction>,
    pub confidence_score: f64,
    pub reasoning: String,
    pub risk_assessment: RiskLevel,
    pub requires_approval: bool,
}

pub struct PlanSynthesizer {
    llm: Option<Arc<dyn LlmClient>>,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    max_tokens: u32,
    approval_threshold: RiskLevel,
}

impl PlanSynthesizer {
    pub fn new(
        llm: Option<Arc<dyn LlmClient>>,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        max_tokens: u32,
        approval_threshold: RiskLevel,
    ) -> Self {
        Self {
            llm,
            history,
            clock,
            ids,
            max_tokens,
            approval_threshold,
        }
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Produce a plan for `ctx`. Never fails; problems degrade to the fallback plan.
    pub async fn create_decision_plan(
        &self,
        ctx: &DecisionContext,
        decision_type: DecisionType,
    ) -> DecisionPlan {
        let plan = match &self.llm {
            None => {
                debug!("no LLM client configured, using fallback plan");
                self.fallback_plan(decision_type)
            }
            Some(llm) => match self.request_plan(llm.as_ref(), ctx, decision_type).await {
                Ok(parsed) => self.assemble(decision_type, parsed, PlanSource::Llm),
                Err(e) => {
                    warn!(
                        provider = llm.provider_name(),
                        model = llm.model_name(),
                        error = %e,
                        "LLM planning failed, using fallback plan"
                    );
                    self.fallback_plan(decision_type)
                }
            },
        };

        info!(
            plan_id = %plan.plan_id,
            source = ?plan.source,
            actions = plan.actions.len(),
            risk = %plan.risk_assessment,
            requires_approval = plan.requires_approval,
            "plan created"
        );
        self.history.record_plan(plan.clone()).await;
        plan
    }

    async fn request_plan(
        &self,
        llm: &dyn LlmClient,
        ctx: &DecisionContext,
        decision_type: DecisionType,
    ) -> Result<ParsedPlan, PlanParseError> {
        let prompt = build_decision_prompt(ctx, decision_type);
        let response = llm.complete(&prompt, self.max_tokens).await?;
        parse_plan_response(&response)
    }

    fn fallback_plan(&self, decision_type: DecisionType) -> DecisionPlan {
        let action = AgentAction::new("fallback_scan", VulnerabilityScan::NAME)
            .with_parameters(serde_json::json!({ "scan_type": ScanType::Comprehensive }))
            .with_risk(RiskLevel::Safe)
            .with_reasoning("Baseline security scan (planner unavailable)")
            .with_expected_outcome("Common vulnerability patterns on the endpoint")
            .with_duration(DEFAULT_ACTION_DURATION);

        let parsed = ParsedPlan {
            actions: vec![action],
            confidence_score: FALLBACK_CONFIDENCE,
            reasoning: "Fallback plan: a single comprehensive vulnerability scan".to_string(),
            risk_assessment: RiskLevel::Safe,
            requires_approval: true,
        };
        self.assemble(decision_type, parsed, PlanSource::Fallback)
    }

    fn assemble(
        &self,
        decision_type: DecisionType,
        parsed: ParsedPlan,
        source: PlanSource,
    ) -> DecisionPlan {
        let mut plan = DecisionPlan {
            plan_id: self.ids.generate_plan_id(),
            decision_type,
            total_estimated_duration: total_duration(&parsed.actions),
            actions: parsed.actions,
            confidence_score: parsed.confidence_score,
            reasoning: parsed.reasoning,
            risk_assessment: parsed.risk_assessment,
            requires_approval: parsed.requires_approval,
            source,
            created_at: self.clock.now(),
        };
        // The gate applies whatever the planner claimed.
        plan.requires_approval = plan.requires_approval || plan.max_risk() >= self.approval_threshold;
        plan
    }
}

/// Parse and validate a planner response.
pub fn parse_plan_response(response: &str) -> Result<ParsedPlan, PlanParseError> {
    let raw: RawPlan = serde_json::from_str(strip_code_fence(response))?;
    if raw.actions.is_empty() {
        return Err(PlanParseError::NoActions);
    }

    let actions: Vec<AgentAction> = raw.actions.into_iter().map(to_action).collect();
    execution_order(&actions)?;

    let action_max = actions
        .iter()
        .map(|a| a.risk_level)
        .max()
        .unwrap_or(RiskLevel::Safe);
    let risk_assessment = match raw.risk_assessment {
        Some(label) => lenient_risk(&label, "plan"),
        None => action_max,
    };

    Ok(ParsedPlan {
        actions,
        confidence_score: clamp_confidence(raw.confidence_score.unwrap_or(FALLBACK_CONFIDENCE)),
        reasoning: raw.reasoning,
        risk_assessment,
        requires_approval: raw.requires_approval.unwrap_or(true),
    })
}

fn to_action(raw: RawAction) -> AgentAction {
    let action_id = String::from(raw.action_id);
    let risk = match raw.risk_level {
        Some(label) => lenient_risk(&label, &action_id),
        None => {
            warn!(action_id = %action_id, "action has no risk_level, treating as MEDIUM");
            RiskLevel::Medium
        }
    };
    let parameters = match raw.parameters {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => other,
    };

    raw.depends_on.into_iter().fold(
        AgentAction::new(action_id, raw.tool_name)
            .with_parameters(parameters)
            .with_risk(risk)
            .with_reasoning(raw.reasoning)
            .with_expected_outcome(raw.expected_outcome)
            .with_duration(raw.estimated_duration.unwrap_or(DEFAULT_ACTION_DURATION)),
        |action, dep| action.depends_on(String::from(dep)),
    )
}

fn lenient_risk(label: &str, subject: &str) -> RiskLevel {
    let (level, recognized) = RiskLevel::parse_lenient(label);
    if !recognized {
        warn!(subject, label, "unknown risk level, treating as MEDIUM");
    }
    level
}

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
