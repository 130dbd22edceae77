//! authentication_analysis: declared auth scheme vs. what the endpoint does.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::endpoint::EndpointView;
use super::report::{Finding, Report};
use crate::domain::{DecisionContext, RiskLevel, ToolError};
use crate::typed::{ToolHandler, ToolInput};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationAnalysis {}

impl ToolInput for AuthenticationAnalysis {
    const NAME: &'static str = "authentication_analysis";
    const DESCRIPTION: &'static str =
        "Check for missing authentication and weak schemes (basic auth, API keys in the query string)";
}

pub struct AuthenticationAnalyzer;

#[async_trait]
impl ToolHandler<AuthenticationAnalysis> for AuthenticationAnalyzer {
    async fn invoke(
        &self,
        _input: AuthenticationAnalysis,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError> {
        let view = EndpointView::new(&ctx.endpoint_data);
        let scheme = view.auth_scheme();
        let mut value = analyze(&view, scheme.as_deref()).into_value();
        value["auth_scheme"] = scheme.map_or(serde_json::Value::Null, serde_json::Value::from);
        Ok(value)
    }
}

fn analyze(view: &EndpointView<'_>, scheme: Option<&str>) -> Report {
    let mut report = Report::new(AuthenticationAnalysis::NAME, view);

    let Some(scheme) = scheme else {
        if view.is_mutating() {
            report.add(
                Finding::new(
                    "missing_authentication",
                    RiskLevel::Critical,
                    format!("{} accepts writes without authentication", view.label()),
                ),
                "Require authentication on every state-changing method",
            );
        } else {
            report.add(
                Finding::new(
                    "missing_authentication",
                    RiskLevel::Medium,
                    "Endpoint is readable without authentication",
                ),
                "Confirm the data is public, otherwise require authentication",
            );
        }
        return report;
    };

    if scheme.contains("basic") {
        report.add(
            Finding::new(
                "weak_scheme",
                RiskLevel::Medium,
                "HTTP Basic authentication sends reusable credentials on every request",
            ),
            "Replace basic auth with short-lived bearer tokens (OAuth2 / OIDC)",
        );
        if view.uses_plain_http() {
            report.add(
                Finding::new(
                    "credentials_in_cleartext",
                    RiskLevel::Critical,
                    "Basic credentials are sent over plain HTTP",
                ),
                "Serve the endpoint over HTTPS only and enable HSTS",
            );
        }
    }

    if scheme.contains("apikey") || scheme.contains("api_key") || scheme.contains("api-key") {
        let in_query = view.api_key_location().as_deref() == Some("query")
            || view
                .parameters
                .iter()
                .any(|p| p.location == "query" && is_key_param(&p.name));
        if in_query {
            report.add(
                Finding::new(
                    "api_key_in_query",
                    RiskLevel::High,
                    "API key is passed in the query string and will end up in logs",
                ),
                "Move the API key to a request header",
            );
        }
    }

    report
}

fn is_key_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    matches!(name.as_str(), "api_key" | "apikey" | "key" | "token" | "access_token")
}
