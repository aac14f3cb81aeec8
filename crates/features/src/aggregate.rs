//! Per-candidate aggregation of the bipartite state.
//!
//! Each candidate row is its variable features followed by the min, mean
//! and max of `[edge features, constraint features]` over the constraints the
//! variable appears in.

use ndarray::{s, Array1, Array2};

use crate::bipartite::BipartiteState;
use crate::error::FeatureError;

/// Width of one aggregated row for a state with the given table widths.
pub fn structural_width(state: &BipartiteState) -> usize {
    let nbr = state.edge_features.ncols() + state.constraint_features.ncols();
    state.variable_features.ncols() + 3 * nbr
}

/// Aggregate the neighbourhood of each candidate LP column.
///
/// Candidates without incident edges keep zero neighbourhood statistics.
/// Any remaining NaN is replaced by zero.
pub fn candidate_structural_features(
    state: &BipartiteState,
    lp_positions: &[usize],
) -> Result<Array2<f64>, FeatureError> {
    let n_vars = state.n_variables();
    let var_width = state.variable_features.ncols();
    let nbr_width = state.edge_features.ncols() + state.constraint_features.ncols();
    let mut out = Array2::zeros((lp_positions.len(), structural_width(state)));

    // incident edges per variable
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); n_vars];
    for (e, &v) in state.edge_variables.iter().enumerate() {
        incident[v].push(e);
    }

    for (i, &pos) in lp_positions.iter().enumerate() {
        if pos >= n_vars {
            return Err(FeatureError::IndexOutOfRange {
                what: "candidate",
                index: pos,
                len: n_vars,
            });
        }
        out.slice_mut(s![i, ..var_width])
            .assign(&state.variable_features.row(pos));

        let edges = &incident[pos];
        if edges.is_empty() {
            continue;
        }
        let mut min = Array1::from_elem(nbr_width, f64::INFINITY);
        let mut max = Array1::from_elem(nbr_width, f64::NEG_INFINITY);
        let mut sum = Array1::<f64>::zeros(nbr_width);
        for &e in edges {
            let c = state.edge_constraints[e];
            let edge_row = state.edge_features.row(e);
            let cons_row = state.constraint_features.row(c);
            let feats = edge_row.iter().chain(cons_row.iter()).copied().enumerate();
            for (k, v) in feats {
                min[k] = min[k].min(v);
                max[k] = max[k].max(v);
                sum[k] += v;
            }
        }
        let mean = sum / edges.len() as f64;
        let base = var_width;
        out.slice_mut(s![i, base..base + nbr_width]).assign(&min);
        out.slice_mut(s![i, base + nbr_width..base + 2 * nbr_width]).assign(&mean);
        out.slice_mut(s![i, base + 2 * nbr_width..]).assign(&max);
    }

    out.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });
    Ok(out)
}
