//! data_exposure_check: sensitive data in responses and query strings.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::endpoint::EndpointView;
use super::report::{Finding, Report};
use crate::domain::{DecisionContext, RiskLevel, ToolError};
use crate::typed::{ToolHandler, ToolInput};

struct SensitivePattern {
    category: &'static str,
    severity: RiskLevel,
    regex: Regex,
}

static SENSITIVE_FIELDS: LazyLock<Vec<SensitivePattern>> = LazyLock::new(|| {
    [
        (
            "credential",
            RiskLevel::Critical,
            r"(?i)(password|passwd|pwd|secret|api_?key|private_?key)",
        ),
        (
            "payment",
            RiskLevel::Critical,
            r"(?i)(card_?number|credit_?card|cc_?num|cvv|cvc|iban|account_?number)",
        ),
        ("token", RiskLevel::High, r"(?i)(token|session|jwt|refresh)"),
        (
            "government_id",
            RiskLevel::High,
            r"(?i)(ssn|social_?security|passport|tax_?id|national_?id)",
        ),
        (
            "contact_pii",
            RiskLevel::Low,
            r"(?i)(email|phone|address|birth|dob)",
        ),
    ]
    .into_iter()
    .map(|(category, severity, pattern)| SensitivePattern {
        category,
        severity,
        regex: Regex::new(pattern).expect("static regex"),
    })
    .collect()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataExposureCheck {
    /// Additional field-name regexes, reported as `custom` with MEDIUM severity.
    pub extra_patterns: Vec<String>,
}

impl ToolInput for DataExposureCheck {
    const NAME: &'static str = "data_exposure_check";
    const DESCRIPTION: &'static str = "Find sensitive fields (credentials, tokens, payment data, PII) in response schemas and query strings (optional `extra_patterns`: regexes)";
}

pub struct DataExposureChecker;

#[async_trait]
impl ToolHandler<DataExposureCheck> for DataExposureChecker {
    async fn invoke(
        &self,
        input: DataExposureCheck,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError> {
        let extra = input
            .extra_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ToolError::invalid_parameters(format!("invalid pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let view = EndpointView::new(&ctx.endpoint_data);
        let mut report = Report::new(DataExposureCheck::NAME, &view);

        let fields = view.response_fields();
        for field in &fields {
            if let Some(p) = SENSITIVE_FIELDS.iter().find(|p| p.regex.is_match(field)) {
                report.add(
                    Finding::new(
                        p.category,
                        p.severity,
                        format!("Response exposes '{field}'"),
                    )
                    .at(format!("response.{field}")),
                    recommendation(p.severity),
                );
            } else if extra.iter().any(|r| r.is_match(field)) {
                report.add(
                    Finding::new(
                        "custom",
                        RiskLevel::Medium,
                        format!("Response exposes '{field}'"),
                    )
                    .at(format!("response.{field}")),
                    recommendation(RiskLevel::Medium),
                );
            }
        }

        for param in view.parameters.iter().filter(|p| p.location == "query") {
            if let Some(p) = SENSITIVE_FIELDS
                .iter()
                .find(|p| p.severity >= RiskLevel::High && p.regex.is_match(&param.name))
            {
                report.add(
                    Finding::new(
                        p.category,
                        RiskLevel::High,
                        format!("Sensitive value '{}' is sent in the query string", param.name),
                    )
                    .at(format!("query.{}", param.name)),
                    "Send sensitive values in headers or the request body, never the URL",
                );
            }
        }

        let mut value = report.into_value();
        value["fields_scanned"] = fields.len().into();
        Ok(value)
    }
}

fn recommendation(severity: RiskLevel) -> &'static str {
    if severity >= RiskLevel::High {
        "Remove secrets from responses; return opaque references instead"
    } else {
        "Return only the fields the client needs and mask personal data"
    }
}
