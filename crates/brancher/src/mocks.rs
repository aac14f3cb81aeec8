//! Mock solver and scoring models for testing without a MIP solver.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use features::{
    BasisStatus, ColumnType, LpColumn, LpRow, LpSnapshot, Nonzero, VariableHistory,
};
use ndarray::Array2;
use ranker::{RankerError, RankingModel};

use crate::state::{BranchOutcome, Candidate, NodeInfo, SearchState};

/// Deterministic LP with `n_cols` columns and `n_rows` rows.
///
/// Column `j` has LP value `j + 0.5`; row `i` touches columns `i` and
/// `i + 1` (when present). No incumbent exists yet.
pub fn mock_snapshot(n_cols: usize, n_rows: usize) -> LpSnapshot {
    let columns = (0..n_cols)
        .map(|j| LpColumn {
            col_type: if j % 2 == 0 {
                ColumnType::Binary
            } else {
                ColumnType::Integer
            },
            obj_coef: 1.0 + j as f64,
            lower_bound: Some(0.0),
            upper_bound: Some(10.0),
            sol_val: j as f64 + 0.5,
            sol_frac: 0.5,
            sol_is_at_lb: false,
            sol_is_at_ub: false,
            basis_status: BasisStatus::Basic,
            reduced_cost: 0.0,
            age: 0,
            incumbent_val: f64::NAN,
            avg_incumbent_val: f64::NAN,
        })
        .collect();
    let rows = (0..n_rows)
        .map(|i| LpRow {
            lhs: None,
            rhs: Some(5.0 + i as f64),
            norm: 2.0_f64.sqrt(),
            obj_cosine: 0.5,
            is_at_lhs: false,
            is_at_rhs: i % 2 == 0,
            dual_val: 0.1 * i as f64,
            age: 0,
        })
        .collect();
    let mut nonzeros = Vec::new();
    for row in 0..n_rows {
        for col in [row, row + 1] {
            if col < n_cols {
                nonzeros.push(Nonzero { row, col, coef: 1.0 });
            }
        }
    }
    LpSnapshot {
        columns,
        rows,
        nonzeros,
        n_lps: 1,
    }
}

// ---------------------------------------------------------------------------
// MockSearchState
// ---------------------------------------------------------------------------

/// Scripted solver state for one node at a time.
///
/// Branching outcomes are popped from a queue and default to
/// [`BranchOutcome::Branched`]. Every executed instruction is logged.
#[derive(Debug)]
pub struct MockSearchState {
    node: NodeInfo,
    candidates: Vec<Candidate>,
    snapshot: LpSnapshot,
    history: Option<Vec<VariableHistory>>,
    outcomes: VecDeque<BranchOutcome>,
    branched: Vec<Candidate>,
    native_calls: usize,
    snapshot_calls: Cell<usize>,
}

impl MockSearchState {
    /// Root node with the given candidates over `snapshot`.
    pub fn new(candidates: Vec<Candidate>, snapshot: LpSnapshot) -> Self {
        Self {
            node: NodeInfo {
                node_count: 1,
                solving_time: 0.0,
                gap: 1.0,
            },
            candidates,
            snapshot,
            history: None,
            outcomes: VecDeque::new(),
            branched: Vec::new(),
            native_calls: 0,
            snapshot_calls: Cell::new(0),
        }
    }

    /// Candidates `0..n` at LP positions `0..n` over a matching snapshot.
    pub fn with_columns(n: usize) -> Self {
        let candidates = (0..n).map(|j| Candidate::new(j, j)).collect();
        Self::new(candidates, mock_snapshot(n, n.saturating_sub(1).max(1)))
    }

    pub fn set_node(&mut self, node_count: u64, solving_time: f64, gap: f64) {
        self.node = NodeInfo {
            node_count,
            solving_time,
            gap,
        };
    }

    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
    }

    pub fn set_history(&mut self, history: Vec<VariableHistory>) {
        self.history = Some(history);
    }

    pub fn push_outcome(&mut self, outcome: BranchOutcome) {
        self.outcomes.push_back(outcome);
    }

    /// Candidates branched on so far, in order.
    pub fn branched(&self) -> &[Candidate] {
        &self.branched
    }

    pub fn native_calls(&self) -> usize {
        self.native_calls
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.get()
    }

    fn next_outcome(&mut self) -> BranchOutcome {
        self.outcomes.pop_front().unwrap_or(BranchOutcome::Branched)
    }
}

impl SearchState for MockSearchState {
    fn node_info(&self) -> NodeInfo {
        self.node
    }

    fn candidates(&self) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.candidates.clone())
    }

    fn lp_snapshot(&self) -> anyhow::Result<LpSnapshot> {
        self.snapshot_calls.set(self.snapshot_calls.get() + 1);
        Ok(self.snapshot.clone())
    }

    fn variable_history(&self, candidates: &[Candidate]) -> anyhow::Result<Vec<VariableHistory>> {
        match &self.history {
            Some(history) => candidates
                .iter()
                .map(|c| {
                    history.get(c.var_id).cloned().ok_or_else(|| {
                        anyhow::anyhow!("no history for variable {}", c.var_id)
                    })
                })
                .collect(),
            None => Ok(vec![VariableHistory::default(); candidates.len()]),
        }
    }

    fn branch_on(&mut self, candidate: &Candidate) -> anyhow::Result<BranchOutcome> {
        if !self.candidates.contains(candidate) {
            anyhow::bail!("variable {} is not a branching candidate", candidate.var_id);
        }
        self.branched.push(*candidate);
        Ok(self.next_outcome())
    }

    fn execute_native_rule(&mut self) -> anyhow::Result<BranchOutcome> {
        self.native_calls += 1;
        Ok(self.next_outcome())
    }
}

// ---------------------------------------------------------------------------
// Scoring models
// ---------------------------------------------------------------------------

/// Ranking model that returns canned scores, cycling when a node has more
/// rows than scores. Counts its calls.
#[derive(Debug, Clone, Default)]
pub struct FixedScores {
    scores: Vec<f64>,
    calls: Arc<AtomicUsize>,
}

impl FixedScores {
    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            scores,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter; stays valid after the model is boxed.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl RankingModel for FixedScores {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, RankerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.scores.is_empty() {
            return Ok(vec![0.0; features.nrows()]);
        }
        Ok((0..features.nrows())
            .map(|i| self.scores[i % self.scores.len()])
            .collect())
    }
}

/// Ranking model scoring each row by one of its feature columns.
#[derive(Debug, Clone)]
pub struct ColumnScore {
    pub column: usize,
}

impl RankingModel for ColumnScore {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, RankerError> {
        if self.column >= features.ncols() {
            return Err(RankerError::WidthMismatch {
                expected: self.column + 1,
                found: features.ncols(),
            });
        }
        Ok(features.column(self.column).to_vec())
    }
}
