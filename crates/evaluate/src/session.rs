//! The boundary to the MIP solver.
//!
//! The solver itself lives outside this workspace. A binding implements
//! [`SolverFactory`] to open one problem at a time and [`SolverSession`] to
//! run branch-and-bound with a [`BranchingController`] installed as the
//! branching rule.

use std::path::Path;

use brancher::BranchingController;
use serde::{Deserialize, Serialize};
use trajectory::SolveStatus;

/// Limits and seed applied to one solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveSettings {
    /// Wall-clock limit in seconds.
    pub time_limit: f64,
    /// Total node limit, -1 for none.
    pub node_limit: i64,
    pub seed: u64,
}

/// What the solver reports once a solve ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveSummary {
    pub nnodes: u64,
    pub nlps: u64,
    /// Solver-reported solving time in seconds.
    pub stime: f64,
    pub final_gap: f64,
    pub status: SolveStatus,
}

pub trait SolverFactory {
    type Session: SolverSession;

    /// Read the problem at `instance` and apply `settings`.
    fn open(&self, instance: &Path, settings: &SolveSettings) -> anyhow::Result<Self::Session>;
}

pub trait SolverSession {
    /// Run the search to completion with `controller` as the branching rule.
    ///
    /// Implementations call [`BranchingController::on_search_start`] when
    /// the search begins and [`BranchingController::on_node`] at every
    /// branching decision, and must abort with its error if `on_node` fails.
    fn optimize(&mut self, controller: &mut BranchingController) -> anyhow::Result<SolveSummary>;
}
