//! Plan structure checks shared by the synthesizer (accept/reject an LLM plan)
//! and the executor (fail fast before running anything).

mod dependency;

pub use dependency::ActionGraph;

use crate::domain::{AgentAction, EngineError};

/// Validate a plan's action list and return the order to execute it in
/// (indexes into `actions`).
pub fn execution_order(actions: &[AgentAction]) -> Result<Vec<usize>, EngineError> {
    ActionGraph::from_actions(actions)?.topological_order()
}
