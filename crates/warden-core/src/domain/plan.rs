//! Plan model: what the planner proposes and the executor consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActionId, PlanId};
use super::risk::RiskLevel;

/// Kind of decision being requested from the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionType {
    AnalysisPlan,
    ActionSequence,
    ToolSelection,
    RiskAssessment,
    OptimizationStrategy,
}

impl DecisionType {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionType::AnalysisPlan => "ANALYSIS_PLAN",
            DecisionType::ActionSequence => "ACTION_SEQUENCE",
            DecisionType::ToolSelection => "TOOL_SELECTION",
            DecisionType::RiskAssessment => "RISK_ASSESSMENT",
            DecisionType::OptimizationStrategy => "OPTIMIZATION_STRATEGY",
        }
    }

    /// Type-specific instruction appended to the planner prompt.
    pub fn guidance(self) -> &'static str {
        match self {
            DecisionType::AnalysisPlan => {
                "Create a comprehensive security analysis plan for this endpoint. \
                 Start with broad scans, then follow up with targeted checks on whatever the scans surface."
            }
            DecisionType::ActionSequence => {
                "Produce an ordered sequence of actions. Use depends_on so that every action \
                 only runs after the actions whose output it needs."
            }
            DecisionType::ToolSelection => {
                "Select the smallest set of tools that covers the endpoint's attack surface. \
                 Prefer SAFE, read-only tools."
            }
            DecisionType::RiskAssessment => {
                "Assess the overall risk of this endpoint. Choose tools that quantify exposure \
                 and justify the risk_assessment you return."
            }
            DecisionType::OptimizationStrategy => {
                "Plan the most time-efficient analysis. Avoid redundant tools and keep \
                 estimated_duration low while preserving coverage."
            }
        }
    }
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed tool invocation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub action_id: ActionId,
    pub tool_name: String,

    #[serde(default)]
    pub parameters: serde_json::Value,

    pub risk_level: RiskLevel,

    #[serde(default)]
    pub reasoning: String,

    #[serde(default)]
    pub expected_outcome: String,

    /// Estimated duration in seconds.
    pub estimated_duration: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ActionId>,
}

impl AgentAction {
    pub fn new(action_id: impl Into<ActionId>, tool_name: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            tool_name: tool_name.into(),
            parameters: serde_json::Value::Object(Default::default()),
            risk_level: RiskLevel::Safe,
            reasoning: String::new(),
            expected_outcome: String::new(),
            estimated_duration: 60,
            depends_on: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_risk(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_expected_outcome(mut self, expected_outcome: impl Into<String>) -> Self {
        self.expected_outcome = expected_outcome.into();
        self
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.estimated_duration = seconds;
        self
    }

    pub fn depends_on(mut self, action_id: impl Into<ActionId>) -> Self {
        self.depends_on.push(action_id.into());
        self
    }
}

/// Where a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanSource {
    Llm,
    Fallback,
}

/// Lifecycle of a recorded plan with respect to the approval gate.
///
/// Transitions:
/// - Pending -> Executed (auto-execute or approval)
/// - Pending -> Rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Pending,
    Executed,
    Rejected,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Executed => "executed",
            PlanStatus::Rejected => "rejected",
        }
    }
}

/// An ordered list of proposed actions for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPlan {
    pub plan_id: PlanId,
    pub decision_type: DecisionType,
    pub actions: Vec<AgentAction>,

    /// Sum of the actions' estimated durations, in seconds.
    pub total_estimated_duration: u64,

    /// In `[0, 1]`.
    pub confidence_score: f64,
    pub reasoning: String,
    pub risk_assessment: RiskLevel,
    pub requires_approval: bool,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
}

impl DecisionPlan {
    /// Highest risk among the plan's own assessment and its actions.
    pub fn max_risk(&self) -> RiskLevel {
        self.actions
            .iter()
            .map(|a| a.risk_level)
            .fold(self.risk_assessment, RiskLevel::max)
    }
}

/// Sum of the actions' estimated durations, saturating at `u64::MAX`.
pub fn total_duration(actions: &[AgentAction]) -> u64 {
    actions
        .iter()
        .map(|a| a.estimated_duration)
        .fold(0, u64::saturating_add)
}

/// Clamp a confidence value into `[0, 1]`; NaN becomes 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
