//! The per-solve branching callback.

use std::sync::Arc;

use features::RootFeatureCache;
use serde::{Deserialize, Serialize};
use trajectory::{GapSnapshot, GapTrajectory, GAP_THRESHOLDS};

use crate::error::BranchError;
use crate::policy::{BranchingPolicy, Decision, DecisionContext};
use crate::state::{BranchOutcome, SearchState};
use crate::tracker::ProgressTracker;

/// Counters and gap readings accumulated over one solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchingStats {
    /// Decision calls since the solve started.
    pub n_visits: usize,
    /// Calls whose branching rule reduced a domain instead of branching.
    pub ndomchgs: u64,
    /// Calls whose branching rule cut the node off.
    pub ncutoffs: u64,
    /// Gap at each node-count threshold, 0 where never reached.
    pub threshold_gaps: [f64; GAP_THRESHOLDS.len()],
}

/// Holds one policy and the state of a single solve around it.
///
/// Build one controller per solve and call
/// [`on_search_start`](Self::on_search_start) before the first node. The
/// policy itself may be shared between controllers.
#[derive(Debug)]
pub struct BranchingController {
    policy: Arc<dyn BranchingPolicy>,
    tracker: ProgressTracker,
    root_cache: RootFeatureCache,
    ndomchgs: u64,
    ncutoffs: u64,
    started: bool,
}

impl BranchingController {
    pub fn new(policy: Box<dyn BranchingPolicy>) -> Self {
        Self::with_shared(Arc::from(policy))
    }

    /// Controller around a policy that other solves also use.
    pub fn with_shared(policy: Arc<dyn BranchingPolicy>) -> Self {
        Self {
            policy,
            tracker: ProgressTracker::new(),
            root_cache: RootFeatureCache::new(),
            ndomchgs: 0,
            ncutoffs: 0,
            started: false,
        }
    }

    pub fn policy(&self) -> &dyn BranchingPolicy {
        self.policy.as_ref()
    }

    pub fn on_search_start(&mut self) {
        self.tracker.reset();
        self.root_cache.clear();
        self.ndomchgs = 0;
        self.ncutoffs = 0;
        self.started = true;
        tracing::debug!(policy = self.policy.name(), "search started");
    }

    /// Decide and execute one branching step at the current node.
    ///
    /// Progress is recorded before the policy runs, so every call adds
    /// exactly one trajectory point even when the decision fails.
    pub fn on_node(&mut self, state: &mut dyn SearchState) -> Result<Decision, BranchError> {
        if !self.started {
            return Err(BranchError::NotStarted);
        }
        let node = state.node_info();
        if let Some(threshold) = self.tracker.record(&node) {
            tracing::debug!(
                policy = self.policy.name(),
                threshold,
                node = node.node_count,
                gap = node.gap,
                "gap threshold reached"
            );
        }

        let decision = {
            let mut ctx = DecisionContext {
                state: &*state,
                node,
                root_cache: &mut self.root_cache,
            };
            self.policy.decide(&mut ctx)?
        };

        let outcome = match decision {
            Decision::Branched(candidate) => state.branch_on(&candidate),
            Decision::Delegated => state.execute_native_rule(),
        }
        .map_err(BranchError::Solver)?;

        match outcome {
            BranchOutcome::DomainReduced => self.ndomchgs += 1,
            BranchOutcome::Cutoff => self.ncutoffs += 1,
            BranchOutcome::Branched | BranchOutcome::Other => {}
        }
        Ok(decision)
    }

    pub fn stats(&self) -> BranchingStats {
        BranchingStats {
            n_visits: self.tracker.n_visits(),
            ndomchgs: self.ndomchgs,
            ncutoffs: self.ncutoffs,
            threshold_gaps: self.tracker.snapshot().reported(),
        }
    }

    pub fn trajectory(&self) -> &GapTrajectory {
        self.tracker.trajectory()
    }

    pub fn snapshot(&self) -> &GapSnapshot {
        self.tracker.snapshot()
    }

    pub fn root_cache(&self) -> &RootFeatureCache {
        &self.root_cache
    }
}
