//! Risk classification for actions and plans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Five-level business classification.
///
/// Ordered from least to most dangerous, so the approval gate can compare
/// against a threshold (`risk >= threshold`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Safe,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Parse a label coming from an untrusted source (LLM output).
    ///
    /// Unknown labels become `Medium`; the bool is `false` in that case so the
    /// caller can log it.
    pub fn parse_lenient(s: &str) -> (Self, bool) {
        match s.parse() {
            Ok(level) => (level, true),
            Err(_) => (RiskLevel::Medium, false),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level '{0}' (expected SAFE, LOW, MEDIUM, HIGH or CRITICAL)")]
pub struct ParseRiskError(pub String);

impl FromStr for RiskLevel {
    type Err = ParseRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Ok(RiskLevel::Safe),
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            _ => Err(ParseRiskError(s.to_string())),
        }
    }
}
