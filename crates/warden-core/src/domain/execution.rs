//! Execution records: the result of running (or skipping) one action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActionId, PlanId};

/// Reason recorded on an action that was not run because a dependency did not succeed.
pub const DEPENDENCIES_FAILED: &str = "Dependencies failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
    Skipped,
}

/// Outcome of one action inside one plan execution.
///
/// - `success` carries `result`
/// - `error` carries `error`
/// - `skipped` carries `reason`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub status: ExecutionStatus,
    pub action_id: ActionId,
    pub tool: String,
    pub plan_id: PlanId,
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Wall time spent in the tool, in seconds.
    pub duration: f64,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    fn base(
        status: ExecutionStatus,
        plan_id: PlanId,
        user_id: &str,
        action_id: &ActionId,
        tool: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            action_id: action_id.clone(),
            tool: tool.to_string(),
            plan_id,
            user_id: user_id.to_string(),
            result: None,
            error: None,
            reason: None,
            duration: 0.0,
            timestamp,
        }
    }

    pub fn success(
        plan_id: PlanId,
        user_id: &str,
        action_id: &ActionId,
        tool: &str,
        result: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            ExecutionStatus::Success,
            plan_id,
            user_id,
            action_id,
            tool,
            timestamp,
        );
        record.result = Some(result);
        record
    }

    pub fn error(
        plan_id: PlanId,
        user_id: &str,
        action_id: &ActionId,
        tool: &str,
        error: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            ExecutionStatus::Error,
            plan_id,
            user_id,
            action_id,
            tool,
            timestamp,
        );
        record.error = Some(error.into());
        record
    }

    pub fn skipped(
        plan_id: PlanId,
        user_id: &str,
        action_id: &ActionId,
        tool: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            ExecutionStatus::Skipped,
            plan_id,
            user_id,
            action_id,
            tool,
            timestamp,
        );
        record.reason = Some(DEPENDENCIES_FAILED.to_string());
        record
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn status_serializes_lowercase() {
        let s = serde_json::to_string(&ExecutionStatus::Skipped).unwrap();
        assert_eq!(s, "\"skipped\"");
    }

    #[test]
    fn skipped_record_has_reason_and_no_payload() {
        let rec = ExecutionRecord::skipped(
            PlanId::from_ulid(Ulid::new()),
            "u1",
            &ActionId::new("a2"),
            "tool",
            Utc::now(),
        );

        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["status"], "skipped");
        assert_eq!(v["reason"], DEPENDENCIES_FAILED);
        assert!(v.get("result").is_none());
        assert!(v.get("error").is_none());
    }

    #[test]
    fn error_record_carries_message() {
        let rec = ExecutionRecord::error(
            PlanId::from_ulid(Ulid::new()),
            "u1",
            &ActionId::new("a1"),
            "nope",
            "Unknown tool: nope",
            Utc::now(),
        )
        .with_duration(0.25);

        assert!(!rec.is_success());
        assert_eq!(rec.error.as_deref(), Some("Unknown tool: nope"));
        assert_eq!(rec.duration, 0.25);
    }
}
