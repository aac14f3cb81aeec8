//! Per-solve gap progress.

use trajectory::{GapSnapshot, GapTrajectory, ProgressPoint};

use crate::state::NodeInfo;

/// Append-only record of the gap at every decision call.
///
/// Time and node count are clamped to never decrease, so both trajectory
/// coordinates are monotone even if the solver reports a stale value.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    trajectory: GapTrajectory,
    snapshot: GapSnapshot,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one visit. Returns the threshold filled by this visit, if any.
    pub fn record(&mut self, node: &NodeInfo) -> Option<u64> {
        let (time, count) = match self.trajectory.last() {
            Some(last) => (
                node.solving_time.max(last.solving_time),
                node.node_count.max(last.node_count),
            ),
            None => (node.solving_time, node.node_count),
        };
        self.trajectory.push(ProgressPoint {
            solving_time: time,
            node_count: count,
            gap: node.gap,
        });
        self.snapshot.record(count, node.gap)
    }

    pub fn trajectory(&self) -> &GapTrajectory {
        &self.trajectory
    }

    pub fn snapshot(&self) -> &GapSnapshot {
        &self.snapshot
    }

    pub fn n_visits(&self) -> usize {
        self.trajectory.len()
    }

    pub fn reset(&mut self) {
        self.trajectory.clear();
        self.snapshot.clear();
    }
}
