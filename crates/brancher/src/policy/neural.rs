//! Graph-network policy.

use burn::prelude::Backend;
use features::extract_state;
use gcnn::NeuralScorer;

use crate::error::BranchError;
use crate::policy::{
    choose, node_candidates, BranchingPolicy, Decision, DecisionContext, PolicyKind,
};

/// Scores every LP column with a [`NeuralScorer`] and branches on the
/// best candidate.
#[derive(Debug)]
pub struct NeuralPolicy<B: Backend> {
    name: String,
    scorer: NeuralScorer<B>,
}

impl<B: Backend> NeuralPolicy<B> {
    pub fn new(name: impl Into<String>, scorer: NeuralScorer<B>) -> Self {
        Self {
            name: name.into(),
            scorer,
        }
    }

    pub fn scorer(&self) -> &NeuralScorer<B> {
        &self.scorer
    }
}

impl<B: Backend> BranchingPolicy for NeuralPolicy<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Neural
    }

    fn decide(&self, ctx: &mut DecisionContext<'_>) -> Result<Decision, BranchError> {
        let candidates = node_candidates(ctx)?;
        if let [only] = candidates.as_slice() {
            return Ok(Decision::Branched(*only));
        }

        let snapshot = ctx.state.lp_snapshot().map_err(BranchError::Solver)?;
        let state = extract_state(&snapshot)?;
        let positions: Vec<usize> = candidates.iter().map(|c| c.lp_pos).collect();
        let scores = self.scorer.score_candidates(&state, &positions)?;

        let best = choose(&self.name, &candidates, &scores)?;
        tracing::trace!(
            policy = %self.name,
            node = ctx.node.node_count,
            candidates = candidates.len(),
            var = best.var_id,
            "neural decision"
        );
        Ok(Decision::Branched(best))
    }
}
