//! rate_limiting_assessment: throttling signals declared on the endpoint.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::endpoint::EndpointView;
use super::report::{Finding, Report};
use crate::domain::{DecisionContext, RiskLevel, ToolError};
use crate::typed::{ToolHandler, ToolInput};

static SENSITIVE_FLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(login|signin|auth|token|password|reset|otp|verify|register|signup)")
        .expect("static regex")
});

const RATE_LIMIT_HEADERS: [&str; 4] = [
    "x-ratelimit-limit",
    "x-rate-limit-limit",
    "ratelimit-limit",
    "ratelimit",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingAssessment {
    /// Expected legitimate traffic, requests per minute.
    pub expected_rpm: Option<u32>,
}

impl ToolInput for RateLimitingAssessment {
    const NAME: &'static str = "rate_limiting_assessment";
    const DESCRIPTION: &'static str =
        "Check for missing rate limiting or throttling headers (optional `expected_rpm`)";
}

pub struct RateLimitingAssessor;

#[async_trait]
impl ToolHandler<RateLimitingAssessment> for RateLimitingAssessor {
    async fn invoke(
        &self,
        input: RateLimitingAssessment,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError> {
        let view = EndpointView::new(&ctx.endpoint_data);
        let mut report = Report::new(RateLimitingAssessment::NAME, &view);

        let headers = view.header_names();
        let has_headers = headers
            .iter()
            .any(|h| RATE_LIMIT_HEADERS.contains(&h.as_str()));
        let config = view.rate_limit();
        let limit = config.and_then(configured_rpm);

        if config.is_none() && !has_headers {
            let severity = if SENSITIVE_FLOW.is_match(&view.path) || view.is_mutating() {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };
            report.add(
                Finding::new(
                    "missing_rate_limit",
                    severity,
                    format!("{} declares no rate limit", view.label()),
                ),
                "Apply per-client rate limits and return 429 with Retry-After when exceeded",
            );
        } else if !headers.iter().any(|h| h == "retry-after") && !has_headers {
            report.add(
                Finding::new(
                    "missing_rate_limit_headers",
                    RiskLevel::Low,
                    "Rate limit is configured but not advertised to clients",
                ),
                "Return X-RateLimit-* and Retry-After headers so clients can back off",
            );
        }

        if let (Some(limit), Some(expected)) = (limit, input.expected_rpm)
            && limit > u64::from(expected).saturating_mul(10)
        {
            report.add(
                Finding::new(
                    "loose_rate_limit",
                    RiskLevel::Low,
                    format!("Limit of {limit} rpm is far above the expected {expected} rpm"),
                ),
                "Tighten the limit to a small multiple of expected traffic",
            );
        }

        let mut value = report.into_value();
        value["rate_limit_rpm"] = limit.map_or(serde_json::Value::Null, serde_json::Value::from);
        Ok(value)
    }
}

/// Requests per minute from a rate-limit declaration like
/// `{"requests_per_minute": 60}`, `{"limit": 100, "window_seconds": 60}` or `60`.
fn configured_rpm(config: &serde_json::Value) -> Option<u64> {
    if let Some(n) = config.as_u64() {
        return Some(n);
    }
    for key in ["requests_per_minute", "rpm"] {
        if let Some(n) = config.get(key).and_then(|v| v.as_u64()) {
            return Some(n);
        }
    }
    let limit = config.get("limit").and_then(|v| v.as_u64())?;
    let window = config
        .get("window_seconds")
        .and_then(|v| v.as_u64())
        .filter(|w| *w > 0)
        .unwrap_or(60);
    Some(limit.saturating_mul(60) / window)
}
