//! Dependency graph between the actions of one plan.
//!
//! Design:
//! - Nodes are indexes into the plan's action list (declaration order).
//! - Forward edges: action -> actions it depends on (waits for)
//! - Reverse edges: action -> actions that depend on it (waiting actions)
//! - Invariant: edges and reverse_edges must be kept in sync

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::{ActionId, AgentAction, EngineError};

/// Dependency graph built from a plan's `depends_on` lists.
#[derive(Debug, Clone)]
pub struct ActionGraph {
    ids: Vec<ActionId>,

    /// Forward edges: node -> nodes it depends on.
    edges: Vec<BTreeSet<usize>>,

    /// Reverse edges: node -> nodes waiting for it.
    reverse_edges: Vec<BTreeSet<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl ActionGraph {
    /// Build the graph, rejecting duplicate ids and dependencies on ids that
    /// are not part of the plan.
    pub fn from_actions(actions: &[AgentAction]) -> Result<Self, EngineError> {
        let mut index: HashMap<&ActionId, usize> = HashMap::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            if index.insert(&action.action_id, i).is_some() {
                return Err(EngineError::DuplicateAction(action.action_id.clone()));
            }
        }

        let mut graph = Self {
            ids: actions.iter().map(|a| a.action_id.clone()).collect(),
            edges: vec![BTreeSet::new(); actions.len()],
            reverse_edges: vec![BTreeSet::new(); actions.len()],
        };

        for (i, action) in actions.iter().enumerate() {
            for dep in &action.depends_on {
                let Some(&j) = index.get(dep) else {
                    return Err(EngineError::UnknownDependency {
                        action: action.action_id.clone(),
                        missing: dep.clone(),
                    });
                };
                graph.add_dependency(i, j);
            }
        }

        Ok(graph)
    }

    /// `node` depends on `depends_on`. Updates both edge maps.
    fn add_dependency(&mut self, node: usize, depends_on: usize) {
        self.edges[node].insert(depends_on);
        self.reverse_edges[depends_on].insert(node);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Nodes `node` waits for, ascending.
    pub fn dependencies(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges[node].iter().copied()
    }

    /// Nodes waiting for `node`, ascending.
    pub fn waiting_on(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.reverse_edges[node].iter().copied()
    }

    /// Topological execution order (Kahn's algorithm).
    ///
    /// Among ready nodes the one declared first is taken first, so a plan that
    /// is already ordered runs exactly in declaration order.
    pub fn topological_order(&self) -> Result<Vec<usize>, EngineError> {
        let mut remaining: Vec<usize> = self.edges.iter().map(BTreeSet::len).collect();
        let mut ready: BTreeSet<usize> = (0..self.len()).filter(|&n| remaining[n] == 0).collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for waiting in self.waiting_on(node) {
                remaining[waiting] -= 1;
                if remaining[waiting] == 0 {
                    ready.insert(waiting);
                }
            }
        }

        if order.len() == self.len() {
            Ok(order)
        } else {
            let cycle = self.detect_cycle().unwrap_or_else(|| {
                // Kahn left nodes behind, so a cycle exists; report the stuck nodes.
                let done: HashSet<usize> = order.iter().copied().collect();
                (0..self.len())
                    .filter(|n| !done.contains(n))
                    .map(|n| self.ids[n].clone())
                    .collect()
            });
            Err(EngineError::DependencyCycle(cycle))
        }
    }

    /// Find one cycle, returned as a closed path (`a -> b -> a`).
    pub fn detect_cycle(&self) -> Option<Vec<ActionId>> {
        let mut color = vec![Color::White; self.len()];
        let mut path = Vec::new();
        for start in 0..self.len() {
            if color[start] == Color::White
                && let Some(cycle) = self.dfs_cycle(start, &mut color, &mut path)
            {
                return Some(cycle.into_iter().map(|n| self.ids[n].clone()).collect());
            }
        }
        None
    }

    fn dfs_cycle(
        &self,
        node: usize,
        color: &mut [Color],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        color[node] = Color::Gray;
        path.push(node);

        for dep in self.dependencies(node) {
            match color[dep] {
                Color::Gray => {
                    let pos = path.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut cycle = path[pos..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_cycle(dep, color, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        color[node] = Color::Black;
        path.pop();
        None
    }
}
