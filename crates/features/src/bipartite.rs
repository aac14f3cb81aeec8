//! Bipartite constraint/variable representation of the LP at a node.
//!
//! ```text
//! constraints (n_cons, 5) ──edges (n_edges, 1)── variables (n_vars, 19)
//! ```
//!
//! Two-sided rows are split: the lhs side becomes a negated `<=` row and the
//! rhs side a plain `<=` row. All lhs-side constraints come first.

use ndarray::{s, Array2};

use crate::error::FeatureError;
use crate::snapshot::{ColumnType, LpSnapshot};

/// Width of the variable feature table.
pub const N_VARIABLE_FEATURES: usize = 19;
/// Width of the constraint feature table.
pub const N_CONSTRAINT_FEATURES: usize = 5;
/// Width of the edge feature table.
pub const N_EDGE_FEATURES: usize = 1;
/// Trailing variable columns that depend on the incumbent solution.
pub const N_INCUMBENT_COLUMNS: usize = 2;

/// Structural representation of the search state at one node.
#[derive(Debug, Clone, PartialEq)]
pub struct BipartiteState {
    /// Constraint features, shape `(n_constraints, N_CONSTRAINT_FEATURES)`.
    pub constraint_features: Array2<f64>,
    /// Constraint endpoint of each edge.
    pub edge_constraints: Vec<usize>,
    /// Variable (LP column) endpoint of each edge.
    pub edge_variables: Vec<usize>,
    /// Edge features, shape `(n_edges, N_EDGE_FEATURES)`.
    pub edge_features: Array2<f64>,
    /// Variable features, shape `(n_variables, N_VARIABLE_FEATURES)`.
    pub variable_features: Array2<f64>,
}

impl BipartiteState {
    pub fn n_constraints(&self) -> usize {
        self.constraint_features.nrows()
    }

    pub fn n_variables(&self) -> usize {
        self.variable_features.nrows()
    }

    pub fn n_edges(&self) -> usize {
        self.edge_constraints.len()
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Build the bipartite representation from a raw LP snapshot.
///
/// Incumbent-relative variable columns that are NaN (no incumbent yet) are
/// replaced by zero before returning.
pub fn extract_state(snapshot: &LpSnapshot) -> Result<BipartiteState, FeatureError> {
    let n_cols = snapshot.columns.len();
    let n_rows = snapshot.rows.len();

    for nz in &snapshot.nonzeros {
        if nz.row >= n_rows {
            return Err(FeatureError::IndexOutOfRange {
                what: "row",
                index: nz.row,
                len: n_rows,
            });
        }
        if nz.col >= n_cols {
            return Err(FeatureError::IndexOutOfRange {
                what: "column",
                index: nz.col,
                len: n_cols,
            });
        }
    }

    let obj_norm = snapshot.objective_norm();
    let age_norm = snapshot.n_lps as f64 + 5.0;

    // Variables
    let mut variable_features = Array2::zeros((n_cols, N_VARIABLE_FEATURES));
    for (j, col) in snapshot.columns.iter().enumerate() {
        let mut row = variable_features.row_mut(j);
        row[col.col_type.one_hot_index()] = 1.0;
        row[4] = col.obj_coef / obj_norm;
        row[5] = flag(col.lower_bound.is_some());
        row[6] = flag(col.upper_bound.is_some());
        row[7] = flag(col.sol_is_at_lb);
        row[8] = flag(col.sol_is_at_ub);
        row[9] = if col.col_type == ColumnType::Continuous {
            0.0
        } else {
            col.sol_frac
        };
        row[10 + col.basis_status.one_hot_index()] = 1.0;
        row[14] = col.reduced_cost / obj_norm;
        row[15] = col.age as f64 / age_norm;
        row[16] = col.sol_val;
        row[17] = col.incumbent_val;
        row[18] = col.avg_incumbent_val;
    }
    if guard_incumbent_columns(&mut variable_features) {
        tracing::debug!("no incumbent yet, zeroed incumbent feature columns");
    }

    // Constraints
    let lhs_rows: Vec<usize> = (0..n_rows).filter(|&i| snapshot.rows[i].lhs.is_some()).collect();
    let rhs_rows: Vec<usize> = (0..n_rows).filter(|&i| snapshot.rows[i].rhs.is_some()).collect();
    let mut lhs_index = vec![None; n_rows];
    let mut rhs_index = vec![None; n_rows];

    let n_cons = lhs_rows.len() + rhs_rows.len();
    let mut constraint_features = Array2::zeros((n_cons, N_CONSTRAINT_FEATURES));
    let sides = lhs_rows
        .iter()
        .map(|&i| (i, -1.0))
        .chain(rhs_rows.iter().map(|&i| (i, 1.0)));
    for (c, (i, sign)) in sides.enumerate() {
        let row = &snapshot.rows[i];
        let norm = snapshot.row_norm(i);
        let (bound, tight) = if sign < 0.0 {
            lhs_index[i] = Some(c);
            (row.lhs.unwrap_or_default(), row.is_at_lhs)
        } else {
            rhs_index[i] = Some(c);
            (row.rhs.unwrap_or_default(), row.is_at_rhs)
        };
        let mut out = constraint_features.row_mut(c);
        out[0] = sign * row.obj_cosine;
        out[1] = sign * bound / norm;
        out[2] = flag(tight);
        out[3] = row.age as f64 / age_norm;
        out[4] = sign * row.dual_val / (norm * obj_norm);
    }

    // Edges, row-major within each side
    let mut nonzeros = snapshot.nonzeros.clone();
    nonzeros.sort_by_key(|nz| (nz.row, nz.col));

    let mut edge_constraints = Vec::new();
    let mut edge_variables = Vec::new();
    let mut edge_values = Vec::new();
    for (index, sign) in [(&lhs_index, -1.0), (&rhs_index, 1.0)] {
        for nz in &nonzeros {
            if let Some(c) = index[nz.row] {
                edge_constraints.push(c);
                edge_variables.push(nz.col);
                edge_values.push(sign * nz.coef / snapshot.row_norm(nz.row));
            }
        }
    }
    let edge_features = Array2::from_shape_vec((edge_values.len(), N_EDGE_FEATURES), edge_values)?;

    Ok(BipartiteState {
        constraint_features,
        edge_constraints,
        edge_variables,
        edge_features,
        variable_features,
    })
}

/// Zero the incumbent-relative columns when they hold NaN.
///
/// Only the trailing [`N_INCUMBENT_COLUMNS`] columns are touched. Returns
/// whether a substitution happened.
pub fn guard_incumbent_columns(variable_features: &mut Array2<f64>) -> bool {
    let n = variable_features.ncols();
    if n < N_INCUMBENT_COLUMNS {
        return false;
    }
    let mut tail = variable_features.slice_mut(s![.., n - N_INCUMBENT_COLUMNS..]);
    if !tail.iter().any(|v| v.is_nan()) {
        return false;
    }
    tail.fill(0.0);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{BasisStatus, LpColumn, LpRow, Nonzero};
    use ndarray::array;

    fn column(obj: f64, sol: f64, incumbent: f64) -> LpColumn {
        LpColumn {
            col_type: ColumnType::Binary,
            obj_coef: obj,
            lower_bound: Some(0.0),
            upper_bound: Some(1.0),
            sol_val: sol,
            sol_frac: sol.fract(),
            sol_is_at_lb: sol == 0.0,
            sol_is_at_ub: sol == 1.0,
            basis_status: BasisStatus::Basic,
            reduced_cost: 0.0,
            age: 0,
            incumbent_val: incumbent,
            avg_incumbent_val: incumbent,
        }
    }

    fn row(lhs: Option<f64>, rhs: Option<f64>) -> LpRow {
        LpRow {
            lhs,
            rhs,
            norm: 2.0,
            obj_cosine: 0.5,
            is_at_lhs: false,
            is_at_rhs: true,
            dual_val: 1.0,
            age: 5,
        }
    }

    fn snapshot() -> LpSnapshot {
        LpSnapshot {
            columns: vec![column(3.0, 0.5, f64::NAN), column(4.0, 1.0, f64::NAN)],
            rows: vec![row(None, Some(1.0)), row(Some(0.0), Some(2.0))],
            nonzeros: vec![
                Nonzero { row: 1, col: 1, coef: 2.0 },
                Nonzero { row: 0, col: 0, coef: 1.0 },
                Nonzero { row: 0, col: 1, coef: 1.0 },
                Nonzero { row: 1, col: 0, coef: -1.0 },
            ],
            n_lps: 5,
        }
    }

    #[test]
    fn test_shapes() {
        let state = extract_state(&snapshot()).unwrap();
        assert_eq!(state.n_variables(), 2);
        // row 1 is two-sided → 1 lhs + 2 rhs constraints
        assert_eq!(state.n_constraints(), 3);
        // row 0 (2 nz) once, row 1 (2 nz) twice
        assert_eq!(state.n_edges(), 6);
        assert_eq!(state.variable_features.ncols(), N_VARIABLE_FEATURES);
        assert_eq!(state.constraint_features.ncols(), N_CONSTRAINT_FEATURES);
        assert_eq!(state.edge_features.dim(), (6, N_EDGE_FEATURES));
    }

    #[test]
    fn test_variable_features_normalized_by_objective() {
        let state = extract_state(&snapshot()).unwrap();
        // obj norm = 5
        assert!((state.variable_features[[0, 4]] - 0.6).abs() < 1e-12);
        assert!((state.variable_features[[1, 4]] - 0.8).abs() < 1e-12);
        // binary one-hot and basic basis one-hot
        assert_eq!(state.variable_features[[0, 0]], 1.0);
        assert_eq!(state.variable_features[[0, 11]], 1.0);
        assert!((state.variable_features[[0, 9]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lhs_side_is_negated_and_first() {
        let state = extract_state(&snapshot()).unwrap();
        // constraint 0 is the lhs side of row 1: bias = -0/2, cos = -0.5
        assert!((state.constraint_features[[0, 0]] + 0.5).abs() < 1e-12);
        assert_eq!(state.constraint_features[[0, 2]], 0.0);
        // constraint 1 is the rhs side of row 0: bias = 1/2
        assert!((state.constraint_features[[1, 1]] - 0.5).abs() < 1e-12);
        assert_eq!(state.constraint_features[[1, 2]], 1.0);
        // lhs edges come first and carry negated coefficients
        assert_eq!(state.edge_constraints[0], 0);
        assert_eq!(state.edge_variables[0], 0);
        assert!((state.edge_features[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((state.edge_features[[1, 0]] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_incumbent_zeroed() {
        let state = extract_state(&snapshot()).unwrap();
        assert!(state.variable_features.iter().all(|v| v.is_finite()));
        assert_eq!(state.variable_features[[0, 17]], 0.0);
        assert_eq!(state.variable_features[[1, 18]], 0.0);
    }

    #[test]
    fn test_incumbent_kept_when_present() {
        let mut snap = snapshot();
        for col in &mut snap.columns {
            col.incumbent_val = 1.0;
            col.avg_incumbent_val = 0.5;
        }
        let state = extract_state(&snap).unwrap();
        assert_eq!(state.variable_features[[0, 17]], 1.0);
        assert_eq!(state.variable_features[[1, 18]], 0.5);
    }

    #[test]
    fn test_out_of_range_nonzero_rejected() {
        let mut snap = snapshot();
        snap.nonzeros.push(Nonzero { row: 0, col: 7, coef: 1.0 });
        let err = extract_state(&snap).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::IndexOutOfRange { what: "column", index: 7, len: 2 }
        ));
    }

    #[test]
    fn test_guard_touches_only_trailing_columns() {
        let mut block = array![
            [1.0, f64::NAN, 2.0, f64::NAN, f64::NAN],
            [3.0, 4.0, f64::NAN, f64::NAN, f64::NAN],
        ];
        assert!(guard_incumbent_columns(&mut block));
        assert_eq!(block[[0, 0]], 1.0);
        assert!(block[[0, 1]].is_nan());
        assert!(block[[1, 2]].is_nan());
        assert_eq!(block.slice(s![.., 3..]).iter().copied().collect::<Vec<_>>(), vec![0.0; 4]);
    }

    #[test]
    fn test_guard_is_noop_without_nan() {
        let mut block = array![[1.0, 2.0, 3.0]];
        let before = block.clone();
        assert!(!guard_incumbent_columns(&mut block));
        assert_eq!(block, before);
    }

    #[test]
    fn test_guard_idempotent() {
        let mut block = array![[1.0, f64::NAN, f64::NAN], [2.0, f64::NAN, f64::NAN]];
        guard_incumbent_columns(&mut block);
        let once = block.clone();
        assert!(!guard_incumbent_columns(&mut block));
        assert_eq!(block, once);
    }
}
