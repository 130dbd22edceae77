//! input_validation_check: parameters the endpoint accepts without constraints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::endpoint::{EndpointView, ParamView};
use super::report::{Finding, Report};
use crate::domain::{DecisionContext, RiskLevel, ToolError};
use crate::typed::{ToolHandler, ToolInput};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputValidationCheck {
    /// Restrict the check to these parameter names. Empty means all.
    pub only: Vec<String>,
}

impl ToolInput for InputValidationCheck {
    const NAME: &'static str = "input_validation_check";
    const DESCRIPTION: &'static str =
        "Find parameters without type, length or pattern constraints (optional `only`: parameter names)";
}

pub struct InputValidationChecker;

#[async_trait]
impl ToolHandler<InputValidationCheck> for InputValidationChecker {
    async fn invoke(
        &self,
        input: InputValidationCheck,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError> {
        let view = EndpointView::new(&ctx.endpoint_data);
        let mut report = Report::new(InputValidationCheck::NAME, &view);

        let selected: Vec<&ParamView> = view
            .parameters
            .iter()
            .filter(|p| input.only.is_empty() || input.only.iter().any(|n| n == &p.name))
            .collect();

        for param in &selected {
            check_param(param, &mut report);
        }

        if view.is_mutating() && !view.has_request_body_schema() {
            report.add(
                Finding::new(
                    "missing_body_schema",
                    RiskLevel::Medium,
                    format!("{} has no request body schema", view.label()),
                ),
                "Validate request bodies against a declared schema",
            );
        }

        let mut value = report.into_value();
        value["parameters_checked"] = selected.len().into();
        Ok(value)
    }
}

fn check_param(param: &ParamView, report: &mut Report) {
    if param.kind.is_none() {
        report.add(
            Finding::new(
                "untyped_parameter",
                RiskLevel::Medium,
                format!("Parameter '{}' has no declared type", param.name),
            )
            .at(param.name.clone()),
            "Declare a type for every parameter",
        );
        return;
    }

    let free_text = matches!(param.kind.as_deref(), Some("string") | Some("object"));
    if free_text && !param.constrained {
        report.add(
            Finding::new(
                "unconstrained_parameter",
                RiskLevel::Low,
                format!(
                    "Parameter '{}' accepts arbitrary input (no maxLength, pattern, enum or format)",
                    param.name
                ),
            )
            .at(param.name.clone()),
            "Bound string inputs with maxLength and a pattern or enum",
        );
    }
}
