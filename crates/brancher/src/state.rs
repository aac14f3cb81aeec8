//! The solver side of a branching call.

use features::{LpSnapshot, VariableHistory};
use serde::{Deserialize, Serialize};

/// Progress of the search at the node being branched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Number of nodes processed so far; 1 at the root.
    pub node_count: u64,
    /// Cumulative solving time in seconds.
    pub solving_time: f64,
    /// Current relative optimality gap.
    pub gap: f64,
}

/// A branching candidate: the solver's variable id and its LP column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub var_id: usize,
    pub lp_pos: usize,
}

impl Candidate {
    pub fn new(var_id: usize, lp_pos: usize) -> Self {
        Self { var_id, lp_pos }
    }
}

/// What the solver reports after executing a branching instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchOutcome {
    Branched,
    /// The rule tightened bounds instead of branching.
    DomainReduced,
    /// The node was cut off.
    Cutoff,
    /// Anything else the solver may report.
    Other,
}

/// Accessor the solver implements for the duration of one branching call.
///
/// Read methods are cheap to call repeatedly except [`SearchState::lp_snapshot`],
/// which copies the whole LP.
pub trait SearchState {
    fn node_info(&self) -> NodeInfo;

    /// Fractional LP candidates in solver order.
    fn candidates(&self) -> anyhow::Result<Vec<Candidate>>;

    fn lp_snapshot(&self) -> anyhow::Result<LpSnapshot>;

    /// Branching history of each candidate, in the same order.
    fn variable_history(&self, candidates: &[Candidate]) -> anyhow::Result<Vec<VariableHistory>>;

    /// Branch on `candidate`.
    fn branch_on(&mut self, candidate: &Candidate) -> anyhow::Result<BranchOutcome>;

    /// Run the solver's built-in branching rule.
    fn execute_native_rule(&mut self) -> anyhow::Result<BranchOutcome>;
}
