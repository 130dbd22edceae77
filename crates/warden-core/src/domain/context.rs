//! DecisionContext: everything the planner may look at for one request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Input bundle for a single analysis request.
///
/// Created fresh per request and never persisted. Maps are `BTreeMap` so the
/// rendered prompt is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionContext {
    pub user_id: String,
    pub project_id: String,

    /// Raw endpoint description (method, path, parameters, ...).
    pub endpoint_data: serde_json::Value,

    #[serde(default)]
    pub historical_data: Vec<serde_json::Value>,

    #[serde(default)]
    pub user_preferences: BTreeMap<String, serde_json::Value>,

    /// Tool names the planner is allowed to use.
    #[serde(default)]
    pub available_tools: Vec<String>,

    #[serde(default)]
    pub current_findings: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_context: Option<String>,
}

impl DecisionContext {
    pub fn new(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        endpoint_data: serde_json::Value,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            endpoint_data,
            ..Self::default()
        }
    }

    pub fn with_available_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_history(mut self, historical_data: Vec<serde_json::Value>) -> Self {
        self.historical_data = historical_data;
        self
    }

    pub fn with_preference(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_preferences.insert(key.into(), value);
        self
    }

    pub fn with_finding(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.current_findings.insert(key.into(), value);
        self
    }

    pub fn with_business_context(mut self, business_context: impl Into<String>) -> Self {
        self.business_context = Some(business_context.into());
        self
    }

    /// Look up a string field of `endpoint_data`.
    pub fn endpoint_str(&self, key: &str) -> Option<&str> {
        self.endpoint_data.get(key).and_then(|v| v.as_str())
    }
}
