//! InMemoryHistory - bounded な履歴ストア
//!
//! # 実装詳細
//! - plan: VecDeque<PlanId>（挿入順）+ HashMap<PlanId, PlanEntry>（index）
//! - execution: VecDeque<ExecutionRecord>（ring buffer）
//! - 容量を超えたら最も古いものから evict
//! - tokio::sync::Mutex で排他制御（lock 中に await しない）

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DecisionPlan, ExecutionRecord, PlanId, PlanStatus};
use crate::ports::HistoryStore;

#[derive(Debug, Clone)]
struct PlanEntry {
    plan: DecisionPlan,
    status: PlanStatus,
}

struct HistoryState {
    plan_order: VecDeque<PlanId>,
    plans: HashMap<PlanId, PlanEntry>,
    executions: VecDeque<ExecutionRecord>,
    plan_capacity: usize,
    execution_capacity: usize,
}

impl HistoryState {
    fn new(plan_capacity: usize, execution_capacity: usize) -> Self {
        Self {
            plan_order: VecDeque::new(),
            plans: HashMap::new(),
            executions: VecDeque::new(),
            plan_capacity: plan_capacity.max(1),
            execution_capacity: execution_capacity.max(1),
        }
    }

    fn push_plan(&mut self, plan: DecisionPlan) {
        let plan_id = plan.plan_id;
        if self
            .plans
            .insert(
                plan_id,
                PlanEntry {
                    plan,
                    status: PlanStatus::Pending,
                },
            )
            .is_some()
        {
            // Re-recording an id replaces the entry but keeps its original slot.
            return;
        }
        self.plan_order.push_back(plan_id);

        while self.plan_order.len() > self.plan_capacity {
            if let Some(evicted) = self.plan_order.pop_front() {
                self.plans.remove(&evicted);
            }
        }
    }

    fn push_execution(&mut self, record: ExecutionRecord) {
        self.executions.push_back(record);
        while self.executions.len() > self.execution_capacity {
            self.executions.pop_front();
        }
    }
}

/// Bounded in-process history of plans and execution records.
#[derive(Clone)]
pub struct InMemoryHistory {
    state: Arc<Mutex<HistoryState>>,
}

impl InMemoryHistory {
    /// Same capacity for plans and execution records.
    pub fn new(capacity: usize) -> Self {
        Self::with_capacities(capacity, capacity)
    }

    pub fn with_capacities(plan_capacity: usize, execution_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HistoryState::new(
                plan_capacity,
                execution_capacity,
            ))),
        }
    }

    /// Number of retained execution records (all users).
    pub async fn execution_count(&self) -> usize {
        self.state.lock().await.executions.len()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn record_plan(&self, plan: DecisionPlan) {
        self.state.lock().await.push_plan(plan);
    }

    async fn find_plan(&self, plan_id: PlanId) -> Option<DecisionPlan> {
        let state = self.state.lock().await;
        state.plans.get(&plan_id).map(|entry| entry.plan.clone())
    }

    async fn plan_status(&self, plan_id: PlanId) -> Option<PlanStatus> {
        let state = self.state.lock().await;
        state.plans.get(&plan_id).map(|entry| entry.status)
    }

    async fn decide_plan(&self, plan_id: PlanId, status: PlanStatus) -> Option<PlanStatus> {
        let mut state = self.state.lock().await;
        let entry = state.plans.get_mut(&plan_id)?;
        let previous = entry.status;
        if previous == PlanStatus::Pending {
            entry.status = status;
        }
        Some(previous)
    }

    async fn record_execution(&self, record: ExecutionRecord) {
        self.state.lock().await.push_execution(record);
    }

    async fn executions_for_user(&self, user_id: &str) -> Vec<ExecutionRecord> {
        let state = self.state.lock().await;
        state
            .executions
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn plan_count(&self) -> usize {
        self.state.lock().await.plan_order.len()
    }
}
