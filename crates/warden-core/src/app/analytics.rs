//! Per-user execution analytics over the retained history.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{ExecutionRecord, ExecutionStatus};

/// Fixed estimate of analyst time saved per successful action.
pub const MINUTES_SAVED_PER_ACTION: u64 = 5;

const TOP_TOOLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUsage {
    pub tool: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecutionAnalytics {
    NoHistory {
        message: String,
    },
    Summary {
        total_autonomous_actions: usize,
        successful_actions: usize,
        failed_actions: usize,
        skipped_actions: usize,
        /// Fraction in `[0, 1]`.
        success_rate: f64,
        time_saved_minutes: u64,
        average_duration_secs: f64,
        most_used_tools: Vec<ToolUsage>,
    },
}

impl ExecutionAnalytics {
    pub fn from_records(user_id: &str, records: &[ExecutionRecord]) -> Self {
        if records.is_empty() {
            return ExecutionAnalytics::NoHistory {
                message: format!("No execution history for user {user_id}"),
            };
        }

        let count = |status| records.iter().filter(|r| r.status == status).count();
        let total = records.len();
        let successful = count(ExecutionStatus::Success);

        let mut usage: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *usage.entry(record.tool.as_str()).or_default() += 1;
        }
        let mut most_used: Vec<ToolUsage> = usage
            .into_iter()
            .map(|(tool, count)| ToolUsage {
                tool: tool.to_string(),
                count,
            })
            .collect();
        most_used.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tool.cmp(&b.tool)));
        most_used.truncate(TOP_TOOLS);

        ExecutionAnalytics::Summary {
            total_autonomous_actions: total,
            successful_actions: successful,
            failed_actions: count(ExecutionStatus::Error),
            skipped_actions: count(ExecutionStatus::Skipped),
            success_rate: successful as f64 / total as f64,
            time_saved_minutes: successful as u64 * MINUTES_SAVED_PER_ACTION,
            average_duration_secs: records.iter().map(|r| r.duration).sum::<f64>() / total as f64,
            most_used_tools: most_used,
        }
    }
}
