//! Raw search-state data handed over by the solver at each node.
//!
//! These are plain values: the solver fills them in from its LP and
//! branching history, the extractor turns them into normalized tables.

use serde::{Deserialize, Serialize};

/// Variable type of an LP column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Binary,
    Integer,
    ImplInt,
    Continuous,
}

impl ColumnType {
    /// Position in the 4-wide one-hot encoding.
    pub fn one_hot_index(self) -> usize {
        match self {
            Self::Binary => 0,
            Self::Integer => 1,
            Self::ImplInt => 2,
            Self::Continuous => 3,
        }
    }
}

/// LP basis status of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasisStatus {
    Lower,
    Basic,
    Upper,
    Zero,
}

impl BasisStatus {
    /// Position in the 4-wide one-hot encoding.
    pub fn one_hot_index(self) -> usize {
        match self {
            Self::Lower => 0,
            Self::Basic => 1,
            Self::Upper => 2,
            Self::Zero => 3,
        }
    }
}

/// One LP column (variable) at the current node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpColumn {
    pub col_type: ColumnType,
    /// Objective coefficient.
    pub obj_coef: f64,
    /// Finite lower bound, `None` for minus infinity.
    pub lower_bound: Option<f64>,
    /// Finite upper bound, `None` for plus infinity.
    pub upper_bound: Option<f64>,
    /// Value in the current LP solution.
    pub sol_val: f64,
    /// Fractional part of `sol_val`.
    pub sol_frac: f64,
    pub sol_is_at_lb: bool,
    pub sol_is_at_ub: bool,
    pub basis_status: BasisStatus,
    pub reduced_cost: f64,
    /// Number of consecutive LPs in which the column was non-basic at zero.
    pub age: u64,
    /// Value in the incumbent solution; NaN until an incumbent exists.
    pub incumbent_val: f64,
    /// Average value over all found solutions; NaN until an incumbent exists.
    pub avg_incumbent_val: f64,
}

/// One LP row (constraint) at the current node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpRow {
    /// Finite left-hand side, `None` for minus infinity.
    pub lhs: Option<f64>,
    /// Finite right-hand side, `None` for plus infinity.
    pub rhs: Option<f64>,
    /// Euclidean norm of the row coefficients.
    pub norm: f64,
    /// Cosine similarity between the row and the objective.
    pub obj_cosine: f64,
    pub is_at_lhs: bool,
    pub is_at_rhs: bool,
    pub dual_val: f64,
    pub age: u64,
}

/// A nonzero constraint coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nonzero {
    pub row: usize,
    pub col: usize,
    pub coef: f64,
}

/// Full LP state at the current node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LpSnapshot {
    pub columns: Vec<LpColumn>,
    pub rows: Vec<LpRow>,
    pub nonzeros: Vec<Nonzero>,
    /// Number of LPs solved so far in this solve.
    pub n_lps: u64,
}

impl LpSnapshot {
    /// Euclidean norm of the objective, or 1 when it vanishes.
    pub fn objective_norm(&self) -> f64 {
        let norm = self
            .columns
            .iter()
            .map(|c| c.obj_coef * c.obj_coef)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            norm
        } else {
            1.0
        }
    }

    /// Row norm with zero replaced by 1.
    pub fn row_norm(&self, row: usize) -> f64 {
        let norm = self.rows[row].norm;
        if norm == 0.0 {
            1.0
        } else {
            norm
        }
    }
}

/// Branching history of one variable, maintained by the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableHistory {
    pub pseudocost_up: f64,
    pub pseudocost_down: f64,
    pub n_branchings_up: u64,
    pub n_branchings_down: u64,
    pub n_cutoffs_up: u64,
    pub n_cutoffs_down: u64,
    pub inference_up: f64,
    pub inference_down: f64,
}
