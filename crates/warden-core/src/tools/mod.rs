//! Tools - builtin analyzers
//!
//! すべて `endpoint_data` に対するパターンマッチのみ。実システムには触れない。
//! 出力は共通の `{tool, endpoint, findings[], risk_score, overall_risk, recommendations[]}`。

pub mod authentication;
pub mod endpoint;
pub mod exposure;
pub mod rate_limit;
pub mod report;
pub mod validation;
pub mod vulnerability;

pub use self::authentication::{AuthenticationAnalysis, AuthenticationAnalyzer};
pub use self::endpoint::EndpointView;
pub use self::exposure::{DataExposureCheck, DataExposureChecker};
pub use self::rate_limit::{RateLimitingAssessment, RateLimitingAssessor};
pub use self::report::{Finding, Report};
pub use self::validation::{InputValidationCheck, InputValidationChecker};
pub use self::vulnerability::{ScanType, VulnerabilityScan, VulnerabilityScanner};

use crate::typed::{RegistryError, ToolInput, ToolRegistry};

/// Names of every builtin tool, in registration order.
pub const BUILTIN_TOOLS: [&str; 5] = [
    VulnerabilityScan::NAME,
    AuthenticationAnalysis::NAME,
    InputValidationCheck::NAME,
    RateLimitingAssessment::NAME,
    DataExposureCheck::NAME,
];

/// Register the five builtin analyzers.
pub fn register_builtin_tools(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register::<VulnerabilityScan, _>(VulnerabilityScanner)?;
    registry.register::<AuthenticationAnalysis, _>(AuthenticationAnalyzer)?;
    registry.register::<InputValidationCheck, _>(InputValidationChecker)?;
    registry.register::<RateLimitingAssessment, _>(RateLimitingAssessor)?;
    registry.register::<DataExposureCheck, _>(DataExposureChecker)?;
    Ok(())
}
