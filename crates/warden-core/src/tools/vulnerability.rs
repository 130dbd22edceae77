//! security_vulnerability_scan: surface-level vulnerability patterns.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::endpoint::EndpointView;
use super::report::{Finding, Report};
use crate::domain::{DecisionContext, RiskLevel, ToolError};
use crate::typed::{ToolHandler, ToolInput};

static INJECTION_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(query|search|filter|sort|order|where|sql|cmd|command|exec|expr)")
        .expect("static regex")
});

static TRAVERSAL_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(file|path|dir|folder|template|include|document)").expect("static regex"));

static ADMIN_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(admin|debug|internal|actuator|console|_debug|phpmyadmin)(/|$)")
        .expect("static regex")
});

static SSRF_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(url|uri|callback|webhook|redirect|return_to|dest)")
        .expect("static regex")
});

static ID_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\{[a-z_]*id\}|:[a-z_]*id\b|/\d+(/|$))").expect("static regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Quick,
    #[default]
    Comprehensive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityScan {
    pub scan_type: ScanType,
}

impl ToolInput for VulnerabilityScan {
    const NAME: &'static str = "security_vulnerability_scan";
    const DESCRIPTION: &'static str = "Scan for injection, path traversal, SSRF, insecure transport and exposed admin paths (scan_type: quick | comprehensive)";
}

pub struct VulnerabilityScanner;

#[async_trait]
impl ToolHandler<VulnerabilityScan> for VulnerabilityScanner {
    async fn invoke(
        &self,
        input: VulnerabilityScan,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError> {
        let view = EndpointView::new(&ctx.endpoint_data);
        let mut report = scan(&view);
        if input.scan_type == ScanType::Comprehensive {
            scan_deep(&view, &mut report);
        }
        let mut value = report.into_value();
        value["scan_type"] = serde_json::to_value(input.scan_type)
            .map_err(|e| ToolError::failed(e.to_string()))?;
        Ok(value)
    }
}

fn scan(view: &EndpointView<'_>) -> Report {
    let mut report = Report::new(VulnerabilityScan::NAME, view);

    if view.uses_plain_http() {
        report.add(
            Finding::new(
                "insecure_transport",
                RiskLevel::High,
                "Endpoint is served over plain HTTP",
            ),
            "Serve the endpoint over HTTPS only and enable HSTS",
        );
    }

    if view.path.contains("../") || view.path.contains("..%2f") {
        report.add(
            Finding::new(
                "path_traversal",
                RiskLevel::High,
                "Path contains a traversal sequence",
            )
            .at(view.path.clone()),
            "Normalize and confine file paths to an allow-listed base directory",
        );
    }

    for param in &view.parameters {
        if TRAVERSAL_PARAM.is_match(&param.name) {
            report.add(
                Finding::new(
                    "path_traversal",
                    RiskLevel::High,
                    format!("Parameter '{}' looks like a file system path", param.name),
                )
                .at(param.name.clone()),
                "Normalize and confine file paths to an allow-listed base directory",
            );
        } else if INJECTION_PARAM.is_match(&param.name) {
            report.add(
                Finding::new(
                    "injection",
                    RiskLevel::Medium,
                    format!(
                        "Parameter '{}' is likely passed to a query or command",
                        param.name
                    ),
                )
                .at(param.name.clone()),
                "Use parameterized queries and never build commands from input",
            );
        }
    }

    if ADMIN_PATH.is_match(&view.path) {
        report.add(
            Finding::new(
                "exposed_admin_path",
                RiskLevel::Medium,
                "Administrative or debug path is publicly routed",
            )
            .at(view.path.clone()),
            "Restrict administrative paths to internal networks or privileged roles",
        );
    }

    report
}

fn scan_deep(view: &EndpointView<'_>, report: &mut Report) {
    for param in &view.parameters {
        if SSRF_PARAM.is_match(&param.name) {
            report.add(
                Finding::new(
                    "ssrf",
                    RiskLevel::High,
                    format!("Parameter '{}' may make the server fetch a URL", param.name),
                )
                .at(param.name.clone()),
                "Allow-list outbound destinations and block internal address ranges",
            );
        }
    }

    if ID_SEGMENT.is_match(&view.path) {
        report.add(
            Finding::new(
                "idor",
                RiskLevel::Low,
                "Resource is addressed by a direct identifier",
            )
            .at(view.path.clone()),
            "Check object-level authorization for every identifier in the path",
        );
    }
}
