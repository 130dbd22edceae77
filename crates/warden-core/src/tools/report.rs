//! Analyzer output shared by every builtin tool.

use serde::Serialize;

use super::endpoint::EndpointView;
use crate::domain::RiskLevel;

const MAX_RISK_SCORE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub category: &'static str,
    pub severity: RiskLevel,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Finding {
    pub fn new(category: &'static str, severity: RiskLevel, description: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Accumulates findings for one analyzer run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    tool: &'static str,
    endpoint: String,
    findings: Vec<Finding>,
    recommendations: Vec<String>,
}

impl Report {
    pub fn new(tool: &'static str, view: &EndpointView<'_>) -> Self {
        Self {
            tool,
            endpoint: view.label(),
            findings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Add a finding and the fix for it. Repeated recommendations are kept once.
    pub fn add(&mut self, finding: Finding, recommendation: &str) {
        self.findings.push(finding);
        if !self.recommendations.iter().any(|r| r == recommendation) {
            self.recommendations.push(recommendation.to_string());
        }
    }

    /// 0-10, sum of per-finding weights.
    pub fn risk_score(&self) -> f64 {
        self.findings
            .iter()
            .map(|f| weight(f.severity))
            .sum::<f64>()
            .min(MAX_RISK_SCORE)
    }

    pub fn overall_risk(&self) -> RiskLevel {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(RiskLevel::Safe)
    }

    pub fn into_value(self) -> serde_json::Value {
        serde_json::json!({
            "tool": self.tool,
            "endpoint": self.endpoint,
            "finding_count": self.findings.len(),
            "risk_score": self.risk_score(),
            "overall_risk": self.overall_risk(),
            "findings": self.findings,
            "recommendations": self.recommendations,
        })
    }
}

fn weight(severity: RiskLevel) -> f64 {
    match severity {
        RiskLevel::Safe => 0.0,
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 2.5,
        RiskLevel::High => 5.0,
        RiskLevel::Critical => 8.0,
    }
}
