//! Prompt builder - DecisionContext を planner 用の指示文に描画する
//!
//! 純粋関数。I/O なし、失敗なし。同じ入力からは常に同じ文字列。

use std::fmt;

use crate::domain::{DecisionContext, DecisionType};

const UNKNOWN: &str = "unknown";

/// Response shape the synthesizer parses.
pub const RESPONSE_SCHEMA: &str = r#"{
  "reasoning": "why this plan",
  "confidence_score": 0.0,
  "risk_assessment": "SAFE | LOW | MEDIUM | HIGH | CRITICAL",
  "requires_approval": true,
  "actions": [
    {
      "action_id": "unique id, e.g. scan_1",
      "tool_name": "one of the available tools",
      "parameters": {},
      "risk_level": "SAFE | LOW | MEDIUM | HIGH | CRITICAL",
      "reasoning": "why this action",
      "expected_outcome": "what it should reveal",
      "estimated_duration": 60,
      "depends_on": ["action_id of an earlier action"]
    }
  ]
}"#;

/// Render the planner instruction for `ctx`.
pub fn build_decision_prompt(ctx: &DecisionContext, decision_type: DecisionType) -> String {
    DecisionPrompt { ctx, decision_type }.to_string()
}

/// Planner instruction as a `Display` value.
pub struct DecisionPrompt<'a> {
    pub ctx: &'a DecisionContext,
    pub decision_type: DecisionType,
}

impl DecisionPrompt<'_> {
    fn field(&self, keys: &[&str]) -> &str {
        keys.iter()
            .find_map(|k| self.ctx.endpoint_data.get(*k).and_then(|v| v.as_str()))
            .unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for DecisionPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.ctx;
        let decision_type = self.decision_type;

        writeln!(
            f,
            "You are an autonomous API security analyst. Decide which analysis tools to run \
             against the endpoint below and return a plan."
        )?;
        writeln!(f)?;
        writeln!(f, "## Endpoint")?;
        writeln!(f, "Method: {}", self.field(&["method", "http_method"]))?;
        writeln!(f, "Path: {}", self.field(&["path", "url", "route"]))?;
        writeln!(f, "Description: {}", self.field(&["description", "summary"]))?;
        writeln!(f, "User: {}", or_unknown(&ctx.user_id))?;
        writeln!(f, "Project: {}", or_unknown(&ctx.project_id))?;
        if let Some(business) = &ctx.business_context {
            writeln!(f, "Business context: {business}")?;
        }

        writeln!(f)?;
        writeln!(f, "## Available tools")?;
        if ctx.available_tools.is_empty() {
            writeln!(f, "(none)")?;
        }
        for tool in &ctx.available_tools {
            writeln!(f, "- {tool}")?;
        }

        writeln!(f)?;
        writeln!(f, "## Current findings")?;
        writeln!(f, "{}", pretty(&ctx.current_findings))?;

        if !ctx.user_preferences.is_empty() {
            writeln!(f)?;
            writeln!(f, "## User preferences")?;
            writeln!(f, "{}", pretty(&ctx.user_preferences))?;
        }

        if !ctx.historical_data.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "## History\n{} previous analyses on record.",
                ctx.historical_data.len()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "## Task ({decision_type})")?;
        writeln!(f, "{}", decision_type.guidance())?;

        writeln!(f)?;
        writeln!(f, "## Response format")?;
        writeln!(
            f,
            "Respond with a single JSON object and nothing else, exactly in this shape:"
        )?;
        writeln!(f, "{RESPONSE_SCHEMA}")?;
        write!(
            f,
            "Only use tool names from the available tools. Action ids must be unique and \
             depends_on may only reference ids in the same plan."
        )
    }
}

fn or_unknown(s: &str) -> &str {
    if s.is_empty() { UNKNOWN } else { s }
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> DecisionContext {
        DecisionContext::new(
            "u1",
            "p1",
            json!({"method": "POST", "path": "/payments", "description": "Create a payment"}),
        )
        .with_available_tools(["security_vulnerability_scan", "data_exposure_check"])
        .with_finding("open_ports", json!([443]))
    }

    #[test]
    fn renders_endpoint_tools_and_findings() {
        let prompt = build_decision_prompt(&ctx(), DecisionType::AnalysisPlan);

        assert!(prompt.contains("Method: POST"));
        assert!(prompt.contains("Path: /payments"));
        assert!(prompt.contains("Description: Create a payment"));
        assert!(prompt.contains("- security_vulnerability_scan"));
        assert!(prompt.contains("- data_exposure_check"));
        assert!(prompt.contains("\"open_ports\""));
        assert!(prompt.contains("ANALYSIS_PLAN"));
        assert!(prompt.contains(DecisionType::AnalysisPlan.guidance()));
        assert!(prompt.contains("\"depends_on\""));
    }

    #[test]
    fn is_deterministic() {
        let a = build_decision_prompt(&ctx(), DecisionType::RiskAssessment);
        let b = build_decision_prompt(&ctx(), DecisionType::RiskAssessment);
        assert_eq!(a, b);
    }

    #[test]
    fn display_matches_builder() {
        let ctx = ctx().with_business_context("PCI scope");
        let prompt = DecisionPrompt { ctx: &ctx, decision_type: DecisionType::ToolSelection };

        assert_eq!(
            format!("{prompt}"),
            build_decision_prompt(&ctx, DecisionType::ToolSelection)
        );
        assert!(format!("{prompt}").starts_with("You are an autonomous API security analyst."));
        assert!(format!("{prompt}").ends_with("ids in the same plan."));
    }

    #[test]
    fn decision_type_changes_guidance() {
        let a = build_decision_prompt(&ctx(), DecisionType::ToolSelection);
        let b = build_decision_prompt(&ctx(), DecisionType::OptimizationStrategy);
        assert_ne!(a, b);
        assert!(b.contains(DecisionType::OptimizationStrategy.guidance()));
    }

    #[test]
    fn empty_context_renders_unknowns() {
        let prompt = build_decision_prompt(&DecisionContext::default(), DecisionType::AnalysisPlan);

        assert!(prompt.contains("Method: unknown"));
        assert!(prompt.contains("Path: unknown"));
        assert!(prompt.contains("User: unknown"));
        assert!(prompt.contains("(none)"));
        assert!(!prompt.contains("Business context"));
    }

    #[test]
    fn business_context_is_included_when_present() {
        let prompt = build_decision_prompt(
            &ctx().with_business_context("PCI scope"),
            DecisionType::AnalysisPlan,
        );
        assert!(prompt.contains("Business context: PCI scope"));
    }

    #[test]
    fn history_and_preferences_only_when_present() {
        let bare = build_decision_prompt(&ctx(), DecisionType::AnalysisPlan);
        assert!(!bare.contains("## History"));
        assert!(!bare.contains("## User preferences"));

        let prompt = build_decision_prompt(
            &ctx()
                .with_history(vec![json!({"plan": 1}), json!({"plan": 2})])
                .with_preference("depth", json!("quick")),
            DecisionType::AnalysisPlan,
        );
        assert!(prompt.contains("2 previous analyses on record."));
        assert!(prompt.contains("\"depth\": \"quick\""));
    }
}
