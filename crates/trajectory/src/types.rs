//! Data types for gap trajectories, threshold snapshots and solve records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node-count thresholds at which the gap is snapshotted, ascending.
pub const GAP_THRESHOLDS: [u64; 7] = [50, 75, 100, 150, 200, 250, 300];

/// Column order of the per-solve report.
pub const REPORT_COLUMNS: [&str; 16] = [
    "nnodes", "nlps", "stime", "finalgap", "50_gap", "75_gap", "100_gap", "150_gap", "200_gap",
    "250_gap", "300_gap", "status", "ndomchgs", "ncutoffs", "walltime", "proctime",
];

/// Gap observed the first time the node count reached each threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapSnapshot {
    slots: [Option<f64>; 7],
}

impl GapSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the first unset slot whose threshold is at most `node_count`.
    ///
    /// At most one slot is set per call and a set slot is never
    /// overwritten. Returns the threshold that was filled, if any.
    pub fn record(&mut self, node_count: u64, gap: f64) -> Option<u64> {
        let i = self
            .slots
            .iter()
            .zip(GAP_THRESHOLDS)
            .position(|(slot, t)| slot.is_none() && t <= node_count)?;
        self.slots[i] = Some(gap);
        Some(GAP_THRESHOLDS[i])
    }

    /// Gap stored for `threshold`, `None` if unset or not a threshold.
    pub fn get(&self, threshold: u64) -> Option<f64> {
        GAP_THRESHOLDS
            .iter()
            .position(|&t| t == threshold)
            .and_then(|i| self.slots[i])
    }

    /// Slots in threshold order.
    pub fn slots(&self) -> &[Option<f64>; 7] {
        &self.slots
    }

    /// Reported values: unset slots read as 0.
    pub fn reported(&self) -> [f64; 7] {
        self.slots.map(|s| s.unwrap_or(0.0))
    }

    pub fn clear(&mut self) {
        self.slots = [None; 7];
    }
}

/// Progress at one node visit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    /// Cumulative solving time in seconds.
    pub solving_time: f64,
    pub node_count: u64,
    pub gap: f64,
}

/// Per-visit progress of one solve; one point per decision call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapTrajectory {
    pub points: Vec<ProgressPoint>,
}

impl GapTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: ProgressPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&ProgressPoint> {
        self.points.last()
    }

    /// `(solving time, gap)` pairs.
    pub fn time_gap(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.solving_time, p.gap)).collect()
    }

    /// `(node count, gap)` pairs.
    pub fn node_gap(&self) -> Vec<(u64, f64)> {
        self.points.iter().map(|p| (p.node_count, p.gap)).collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Terminal status of a solve, as reported by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimeLimit,
    NodeLimit,
    GapLimit,
    UserInterrupt,
    Unknown,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Optimal => "optimal",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::TimeLimit => "timelimit",
            Self::NodeLimit => "nodelimit",
            Self::GapLimit => "gaplimit",
            Self::UserInterrupt => "userinterrupt",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl SolveStatus {
    /// Parse from string. Returns Unknown for unrecognized values.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "optimal" => Self::Optimal,
            "infeasible" => Self::Infeasible,
            "unbounded" => Self::Unbounded,
            "timelimit" => Self::TimeLimit,
            "nodelimit" => Self::NodeLimit,
            "gaplimit" => Self::GapLimit,
            "userinterrupt" => Self::UserInterrupt,
            _ => Self::Unknown,
        }
    }
}

/// One row of the results file: identity columns followed by the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRecord {
    pub policy: String,
    pub seed: u64,
    /// Instance class, e.g. `small`, `medium` or `big`.
    #[serde(rename = "type")]
    pub instance_type: String,
    pub instance: String,
    pub nnodes: u64,
    pub nlps: u64,
    /// Solver-reported solving time in seconds.
    pub stime: f64,
    pub finalgap: f64,
    /// Gap snapshots in [`GAP_THRESHOLDS`] order, 0 when never reached.
    pub threshold_gaps: [f64; 7],
    pub status: SolveStatus,
    pub ndomchgs: u64,
    pub ncutoffs: u64,
    pub walltime: f64,
    pub proctime: f64,
}

impl SolveRecord {
    /// Node count charging domain reductions and cutoffs as two nodes each.
    pub fn fair_node_count(&self) -> u64 {
        self.nnodes + 2 * (self.ndomchgs + self.ncutoffs)
    }
}

/// One stored gap-trace point with its solve identity.
#[derive(Debug, Clone, PartialEq)]
pub struct GapTraceRow {
    pub policy: String,
    pub seed: u64,
    pub instance: String,
    /// Position of the point within its solve.
    pub step: u64,
    pub point: ProgressPoint,
}

/// Quick statistics from a gap-trace file.
#[derive(Debug, Clone, PartialEq)]
pub struct GapTraceSummary {
    pub total_points: usize,
    /// Distinct `(policy, seed, instance)` solves.
    pub solves: usize,
    pub unique_policies: usize,
    pub unique_instances: usize,
    /// Mean over solves of the gap at the last recorded point.
    pub mean_final_gap: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_scenario() {
        let mut snap = GapSnapshot::new();
        let visits = [(10, 0.5), (60, 0.3), (80, 0.3), (120, 0.2)];
        let filled: Vec<Option<u64>> = visits.iter().map(|&(n, g)| snap.record(n, g)).collect();
        assert_eq!(filled, vec![None, Some(50), Some(75), Some(100)]);
        assert_eq!(snap.get(50), Some(0.3));
        assert_eq!(snap.get(75), Some(0.3));
        assert_eq!(snap.get(100), Some(0.2));
        assert_eq!(snap.get(150), None);
        assert_eq!(snap.reported(), [0.3, 0.3, 0.2, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_snapshot_one_slot_per_call() {
        // a jump past several thresholds fills only the lowest one
        let mut snap = GapSnapshot::new();
        assert_eq!(snap.record(1000, 0.9), Some(50));
        assert_eq!(snap.record(1000, 0.8), Some(75));
        assert_eq!(snap.slots()[2], None);
    }

    #[test]
    fn test_snapshot_never_overwrites() {
        let mut snap = GapSnapshot::new();
        snap.record(50, 0.4);
        for _ in 0..10 {
            snap.record(60, 0.1);
        }
        assert_eq!(snap.get(50), Some(0.4));
        assert_eq!(snap.get(75), None);
        snap.clear();
        assert_eq!(snap.get(50), None);
    }

    #[test]
    fn test_non_threshold_lookup() {
        assert_eq!(GapSnapshot::new().get(51), None);
    }

    #[test]
    fn test_trajectory_pairs() {
        let mut traj = GapTrajectory::new();
        traj.push(ProgressPoint { solving_time: 0.5, node_count: 1, gap: 1.0 });
        traj.push(ProgressPoint { solving_time: 0.7, node_count: 2, gap: 0.5 });
        assert_eq!(traj.time_gap(), vec![(0.5, 1.0), (0.7, 0.5)]);
        assert_eq!(traj.node_gap(), vec![(1, 1.0), (2, 0.5)]);
        assert_eq!(traj.len(), 2);
    }

    #[test]
    fn test_status_display_and_parse() {
        for status in [
            SolveStatus::Optimal,
            SolveStatus::Infeasible,
            SolveStatus::Unbounded,
            SolveStatus::TimeLimit,
            SolveStatus::NodeLimit,
            SolveStatus::GapLimit,
            SolveStatus::UserInterrupt,
            SolveStatus::Unknown,
        ] {
            assert_eq!(SolveStatus::from_str_lossy(&status.to_string()), status);
        }
        assert_eq!(SolveStatus::from_str_lossy("garbage"), SolveStatus::Unknown);
        assert_eq!(serde_json::to_string(&SolveStatus::TimeLimit).unwrap(), "\"timelimit\"");
    }

    #[test]
    fn test_fair_node_count() {
        let record = SolveRecord {
            policy: "p".into(),
            seed: 0,
            instance_type: "small".into(),
            instance: "a.lp".into(),
            nnodes: 10,
            nlps: 20,
            stime: 1.0,
            finalgap: 0.0,
            threshold_gaps: [0.0; 7],
            status: SolveStatus::Optimal,
            ndomchgs: 2,
            ncutoffs: 1,
            walltime: 1.1,
            proctime: 1.0,
        };
        assert_eq!(record.fair_node_count(), 16);
    }
}
