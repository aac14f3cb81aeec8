//! Per-policy aggregates over solve records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trajectory::{SolveRecord, GAP_THRESHOLDS};

/// Summary of every solve one policy ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAggregate {
    pub policy: String,
    pub solves: usize,
    pub mean_nnodes: f64,
    /// Mean of `nnodes + 2 * (ndomchgs + ncutoffs)`.
    pub mean_fair_nnodes: f64,
    pub mean_stime: f64,
    pub median_stime: f64,
    pub mean_finalgap: f64,
    /// Mean gap at each node-count threshold, in [`GAP_THRESHOLDS`] order,
    /// over the solves that explored at least that many nodes.
    pub mean_threshold_gaps: [f64; GAP_THRESHOLDS.len()],
    /// Number of solves behind each entry of `mean_threshold_gaps`.
    pub threshold_solves: [usize; GAP_THRESHOLDS.len()],
    /// Number of solves per final status.
    pub status_counts: BTreeMap<String, usize>,
}

/// Compute the median of a slice of f64 values.
///
/// Returns 0.0 for empty slices.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Group records by policy label, sorted by label.
pub fn aggregate_by_policy(records: &[SolveRecord]) -> Vec<PolicyAggregate> {
    let mut groups: BTreeMap<&str, Vec<&SolveRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.policy.as_str()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(policy, rows)| {
            let mut stimes: Vec<f64> = rows.iter().map(|r| r.stime).collect();
            let mut mean_threshold_gaps = [0.0; GAP_THRESHOLDS.len()];
            let mut threshold_solves = [0; GAP_THRESHOLDS.len()];
            for (k, &threshold) in GAP_THRESHOLDS.iter().enumerate() {
                // solves that stopped short read 0 there, which is not a gap
                let reached: Vec<f64> = rows
                    .iter()
                    .filter(|r| r.nnodes >= threshold)
                    .map(|r| r.threshold_gaps[k])
                    .collect();
                threshold_solves[k] = reached.len();
                mean_threshold_gaps[k] = mean(reached.into_iter());
            }
            let mut status_counts = BTreeMap::new();
            for r in &rows {
                *status_counts.entry(r.status.to_string()).or_insert(0) += 1;
            }
            PolicyAggregate {
                policy: policy.to_string(),
                solves: rows.len(),
                mean_nnodes: mean(rows.iter().map(|r| r.nnodes as f64)),
                mean_fair_nnodes: mean(rows.iter().map(|r| r.fair_node_count() as f64)),
                mean_stime: mean(stimes.iter().copied()),
                median_stime: median(&mut stimes),
                mean_finalgap: mean(rows.iter().map(|r| r.finalgap)),
                mean_threshold_gaps,
                threshold_solves,
                status_counts,
            }
        })
        .collect()
}
