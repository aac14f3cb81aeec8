//! Hand-engineered historical statistics per candidate.
//!
//! The block has two parts: a static part that only depends on the problem
//! structure and is computed once at the root node, and a dynamic part
//! rebuilt at every node from the solver's branching history. The static
//! part lives in a [`RootFeatureCache`] owned by the caller for the length of
//! one solve.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use ndarray::{concatenate, Array2, Axis};

use crate::error::FeatureError;
use crate::snapshot::{LpSnapshot, VariableHistory};

/// Width of the root-static part.
pub const N_ROOT_FEATURES: usize = 8;
/// Width of the per-node dynamic part.
pub const N_DYNAMIC_FEATURES: usize = 10;
/// Width of the full historical block.
pub const HISTORICAL_WIDTH: usize = N_ROOT_FEATURES + N_DYNAMIC_FEATURES;

/// Key of a root-only feature group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootFeatureGroup {
    /// Static structure statistics of every LP column.
    HistoricalStatic,
}

/// Once-computed root feature blocks, indexed by LP column.
///
/// Entries are never replaced; only [`RootFeatureCache::clear`] removes them.
#[derive(Debug, Default)]
pub struct RootFeatureCache {
    blocks: HashMap<RootFeatureGroup, Array2<f64>>,
}

impl RootFeatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached block, computing it with `compute` on first use.
    pub fn get_or_try_insert<F>(
        &mut self,
        group: RootFeatureGroup,
        compute: F,
    ) -> Result<&Array2<f64>, FeatureError>
    where
        F: FnOnce() -> Result<Array2<f64>, FeatureError>,
    {
        match self.blocks.entry(group) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let block = compute()?;
                tracing::debug!(?group, rows = block.nrows(), "cached root features");
                Ok(entry.insert(block))
            }
        }
    }

    pub fn get(&self, group: RootFeatureGroup) -> Option<&Array2<f64>> {
        self.blocks.get(&group)
    }

    pub fn contains(&self, group: RootFeatureGroup) -> bool {
        self.blocks.contains_key(&group)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every cached block. Called when a new solve starts.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

/// Static structure statistics for every LP column.
///
/// Columns: objective sign, normalized objective magnitude, constraint
/// degree ratio, max/min positive coefficient, max/min magnitude of negative
/// coefficients, mean coefficient magnitude. Coefficients are divided by
/// their row norm.
pub fn root_static_features(snapshot: &LpSnapshot) -> Result<Array2<f64>, FeatureError> {
    let n_cols = snapshot.columns.len();
    let n_rows = snapshot.rows.len().max(1) as f64;
    let obj_norm = snapshot.objective_norm();

    let mut degree = vec![0usize; n_cols];
    let mut pos_max = vec![f64::NEG_INFINITY; n_cols];
    let mut pos_min = vec![f64::INFINITY; n_cols];
    let mut neg_max = vec![f64::NEG_INFINITY; n_cols];
    let mut neg_min = vec![f64::INFINITY; n_cols];
    let mut abs_sum = vec![0.0; n_cols];

    for nz in &snapshot.nonzeros {
        if nz.col >= n_cols {
            return Err(FeatureError::IndexOutOfRange {
                what: "column",
                index: nz.col,
                len: n_cols,
            });
        }
        if nz.row >= snapshot.rows.len() {
            return Err(FeatureError::IndexOutOfRange {
                what: "row",
                index: nz.row,
                len: snapshot.rows.len(),
            });
        }
        let j = nz.col;
        let v = nz.coef / snapshot.row_norm(nz.row);
        degree[j] += 1;
        abs_sum[j] += v.abs();
        if v > 0.0 {
            pos_max[j] = pos_max[j].max(v);
            pos_min[j] = pos_min[j].min(v);
        } else if v < 0.0 {
            neg_max[j] = neg_max[j].max(-v);
            neg_min[j] = neg_min[j].min(-v);
        }
    }

    let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
    let mut out = Array2::zeros((n_cols, N_ROOT_FEATURES));
    for (j, col) in snapshot.columns.iter().enumerate() {
        let mut row = out.row_mut(j);
        row[0] = if col.obj_coef > 0.0 {
            1.0
        } else if col.obj_coef < 0.0 {
            -1.0
        } else {
            0.0
        };
        row[1] = col.obj_coef.abs() / obj_norm;
        row[2] = degree[j] as f64 / n_rows;
        row[3] = finite_or_zero(pos_max[j]);
        row[4] = finite_or_zero(pos_min[j]);
        row[5] = finite_or_zero(neg_max[j]);
        row[6] = finite_or_zero(neg_min[j]);
        row[7] = if degree[j] > 0 {
            abs_sum[j] / degree[j] as f64
        } else {
            0.0
        };
    }
    Ok(out)
}

fn max_or_one(values: impl Iterator<Item = f64>) -> f64 {
    let m = values.fold(0.0_f64, f64::max);
    if m > 0.0 {
        m
    } else {
        1.0
    }
}

/// Per-node dynamic statistics for the candidates.
///
/// Pseudocosts, branching counts and inference scores are divided by their
/// maximum over the candidate set so rows are comparable within a node.
pub fn dynamic_features(
    snapshot: &LpSnapshot,
    lp_positions: &[usize],
    history: &[VariableHistory],
) -> Result<Array2<f64>, FeatureError> {
    if history.len() != lp_positions.len() {
        return Err(FeatureError::WidthMismatch {
            expected: lp_positions.len(),
            found: history.len(),
        });
    }
    let pc_scale = max_or_one(
        history
            .iter()
            .flat_map(|h| [h.pseudocost_up, h.pseudocost_down]),
    );
    let br_scale = max_or_one(
        history
            .iter()
            .map(|h| (h.n_branchings_up + h.n_branchings_down) as f64),
    );
    let inf_scale = max_or_one(
        history
            .iter()
            .map(|h| 0.5 * (h.inference_up + h.inference_down)),
    );

    let mut out = Array2::zeros((lp_positions.len(), N_DYNAMIC_FEATURES));
    for (i, (&pos, h)) in lp_positions.iter().zip(history).enumerate() {
        let col = snapshot.columns.get(pos).ok_or(FeatureError::IndexOutOfRange {
            what: "candidate",
            index: pos,
            len: snapshot.columns.len(),
        })?;
        let x = col.sol_val;
        let lo = h.pseudocost_up.min(h.pseudocost_down);
        let hi = h.pseudocost_up.max(h.pseudocost_down);

        let mut row = out.row_mut(i);
        row[0] = col.sol_frac;
        row[1] = x.ceil() - x;
        row[2] = x - x.floor();
        row[3] = h.pseudocost_up / pc_scale;
        row[4] = h.pseudocost_down / pc_scale;
        row[5] = if hi > 0.0 { lo / hi } else { 0.0 };
        row[6] = (h.n_branchings_up + h.n_branchings_down) as f64 / br_scale;
        row[7] = h.n_cutoffs_up as f64 / h.n_branchings_up.max(1) as f64;
        row[8] = h.n_cutoffs_down as f64 / h.n_branchings_down.max(1) as f64;
        row[9] = 0.5 * (h.inference_up + h.inference_down) / inf_scale;
    }
    Ok(out)
}

/// Full historical block: root-static rows for the candidates followed by
/// the dynamic part.
pub fn historical_features(
    root: &Array2<f64>,
    snapshot: &LpSnapshot,
    lp_positions: &[usize],
    history: &[VariableHistory],
) -> Result<Array2<f64>, FeatureError> {
    if root.ncols() != N_ROOT_FEATURES {
        return Err(FeatureError::WidthMismatch {
            expected: N_ROOT_FEATURES,
            found: root.ncols(),
        });
    }
    for &pos in lp_positions {
        if pos >= root.nrows() {
            return Err(FeatureError::IndexOutOfRange {
                what: "candidate",
                index: pos,
                len: root.nrows(),
            });
        }
    }
    let static_rows = root.select(Axis(0), lp_positions);
    let dynamic = dynamic_features(snapshot, lp_positions, history)?;
    Ok(concatenate(Axis(1), &[static_rows.view(), dynamic.view()])?)
}
