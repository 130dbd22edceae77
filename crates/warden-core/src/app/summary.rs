//! Human-facing views of a plan (approval prompt).

use serde::Serialize;

use crate::domain::{ActionId, DecisionPlan, DecisionType, PlanId, PlanSource, RiskLevel};

const PREVIEW_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPreview {
    pub action_id: ActionId,
    pub tool: String,
    pub reasoning: String,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionSummary {
    pub plan_id: PlanId,
    pub decision_type: DecisionType,
    pub total_actions: usize,
    pub estimated_duration_minutes: f64,
    pub confidence_score: f64,
    pub risk_assessment: RiskLevel,
    pub requires_approval: bool,
    pub source: PlanSource,
    pub reasoning: String,
    /// First three actions.
    pub actions_preview: Vec<ActionPreview>,
}

impl DecisionSummary {
    pub fn of(plan: &DecisionPlan) -> Self {
        Self {
            plan_id: plan.plan_id,
            decision_type: plan.decision_type,
            total_actions: plan.actions.len(),
            estimated_duration_minutes: plan.total_estimated_duration as f64 / 60.0,
            confidence_score: plan.confidence_score,
            risk_assessment: plan.risk_assessment,
            requires_approval: plan.requires_approval,
            source: plan.source,
            reasoning: plan.reasoning.clone(),
            actions_preview: plan
                .actions
                .iter()
                .take(PREVIEW_LEN)
                .map(|a| ActionPreview {
                    action_id: a.action_id.clone(),
                    tool: a.tool_name.clone(),
                    reasoning: a.reasoning.clone(),
                    risk_level: a.risk_level,
                })
                .collect(),
        }
    }
}
