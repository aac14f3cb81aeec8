//! Ranking-model policy over per-candidate feature rows.

use ndarray::{concatenate, Array2, ArrayView2, Axis};

use features::{
    candidate_structural_features, extract_state, historical_features, preprocess,
    root_static_features, FeatureError, LpSnapshot, RootFeatureGroup,
};
use ranker::TabularModel;

use crate::error::BranchError;
use crate::policy::{
    choose, node_candidates, BranchingPolicy, Decision, DecisionContext, PolicyKind,
};
use crate::state::Candidate;

/// Builds one feature row per candidate (structural block, historical
/// block, or both side by side), preprocesses, scales and scores them.
///
/// The root-static part of the historical block is computed once per solve,
/// at node 1, and reused from the controller's cache afterwards.
#[derive(Debug)]
pub struct TabularPolicy {
    name: String,
    model: TabularModel,
}

impl TabularPolicy {
    pub fn new(name: impl Into<String>, model: TabularModel) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }

    pub fn model(&self) -> &TabularModel {
        &self.model
    }

    fn feature_rows(
        &self,
        ctx: &mut DecisionContext<'_>,
        snapshot: &LpSnapshot,
        candidates: &[Candidate],
    ) -> Result<Array2<f64>, BranchError> {
        let family = self.model.spec.family;
        let positions: Vec<usize> = candidates.iter().map(|c| c.lp_pos).collect();
        let mut blocks: Vec<Array2<f64>> = Vec::with_capacity(2);

        if family.uses_structural() {
            let state = extract_state(snapshot)?;
            blocks.push(candidate_structural_features(&state, &positions)?);
        }
        if family.uses_historical() {
            let history = ctx
                .state
                .variable_history(candidates)
                .map_err(BranchError::Solver)?;
            let root = ctx
                .root_cache
                .get_or_try_insert(RootFeatureGroup::HistoricalStatic, || {
                    root_static_features(snapshot)
                })?;
            blocks.push(historical_features(root, snapshot, &positions, &history)?);
        }

        let views: Vec<ArrayView2<'_, f64>> = blocks.iter().map(|b| b.view()).collect();
        let rows = concatenate(Axis(1), &views).map_err(FeatureError::from)?;
        Ok(rows)
    }
}

impl BranchingPolicy for TabularPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::TabularRanking
    }

    fn decide(&self, ctx: &mut DecisionContext<'_>) -> Result<Decision, BranchError> {
        let candidates = node_candidates(ctx)?;
        let spec = self.model.spec;

        // Root-static features are taken at the root even when it has a
        // single candidate.
        let mut root_snapshot = None;
        if spec.family.uses_historical() && ctx.node.node_count == 1 {
            let snapshot = ctx.state.lp_snapshot().map_err(BranchError::Solver)?;
            ctx.root_cache
                .get_or_try_insert(RootFeatureGroup::HistoricalStatic, || {
                    root_static_features(&snapshot)
                })?;
            root_snapshot = Some(snapshot);
        }

        if let [only] = candidates.as_slice() {
            return Ok(Decision::Branched(*only));
        }

        let snapshot = match root_snapshot {
            Some(snapshot) => snapshot,
            None => ctx.state.lp_snapshot().map_err(BranchError::Solver)?,
        };
        let rows = self.feature_rows(ctx, &snapshot, &candidates)?;
        let rows = preprocess(rows, spec.augment, spec.bound_normalize);
        let scores = self.model.score(rows)?;

        let best = choose(&self.name, &candidates, &scores)?;
        tracing::trace!(
            policy = %self.name,
            node = ctx.node.node_count,
            candidates = candidates.len(),
            var = best.var_id,
            "tabular decision"
        );
        Ok(Decision::Branched(best))
    }
}
