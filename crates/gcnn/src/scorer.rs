//! Neural scoring of branching candidates.

use burn::prelude::*;
use features::BipartiteState;

use crate::bridge::{state_to_tensors, tensor_to_vec};
use crate::error::GcnnError;
use crate::model::{GcnnPolicy, GcnnPolicyConfig};

/// Runs a loaded [`GcnnPolicy`] on one node and masks the logits to the
/// candidate LP positions.
///
/// Convention: higher score = better branching candidate.
#[derive(Debug)]
pub struct NeuralScorer<B: Backend> {
    model: GcnnPolicy<B>,
    config: GcnnPolicyConfig,
    device: B::Device,
}

impl<B: Backend> NeuralScorer<B> {
    pub fn new(model: GcnnPolicy<B>, config: GcnnPolicyConfig, device: B::Device) -> Self {
        Self {
            model,
            config,
            device,
        }
    }

    pub fn config(&self) -> &GcnnPolicyConfig {
        &self.config
    }

    /// Logits of every LP column.
    pub fn score_all(&self, state: &BipartiteState) -> Result<Vec<f64>, GcnnError> {
        self.check_widths(state)?;
        let t = state_to_tensors::<B>(state, &self.device);
        let logits = self.model.forward(
            t.constraint_features,
            t.edge_constraints,
            t.edge_variables,
            t.edge_features,
            t.variable_features,
        );
        tensor_to_vec(logits)
    }

    /// Scores of the candidates, in candidate order.
    ///
    /// Fails with [`GcnnError::NanScores`] if any masked score is NaN.
    pub fn score_candidates(
        &self,
        state: &BipartiteState,
        lp_positions: &[usize],
    ) -> Result<Vec<f64>, GcnnError> {
        let logits = self.score_all(state)?;
        let scores = mask_scores(&logits, lp_positions)?;
        tracing::trace!(candidates = scores.len(), "scored candidates");
        Ok(scores)
    }

    fn check_widths(&self, state: &BipartiteState) -> Result<(), GcnnError> {
        let checks = [
            ("variable", self.config.var_nfeats, state.variable_features.ncols()),
            ("edge", self.config.edge_nfeats, state.edge_features.ncols()),
        ];
        for (table, expected, found) in checks {
            if expected != found {
                return Err(GcnnError::InputWidth {
                    table,
                    expected,
                    found,
                });
            }
        }
        if state.n_constraints() > 0 && state.constraint_features.ncols() != self.config.cons_nfeats {
            return Err(GcnnError::InputWidth {
                table: "constraint",
                expected: self.config.cons_nfeats,
                found: state.constraint_features.ncols(),
            });
        }
        Ok(())
    }
}

/// Pick the logits at the candidate LP positions, rejecting NaN.
pub fn mask_scores(logits: &[f64], lp_positions: &[usize]) -> Result<Vec<f64>, GcnnError> {
    let mut scores = Vec::with_capacity(lp_positions.len());
    for &pos in lp_positions {
        let v = logits.get(pos).ok_or(GcnnError::CandidateOutOfRange {
            index: pos,
            len: logits.len(),
        })?;
        scores.push(*v);
    }
    let nan = scores.iter().filter(|v| v.is_nan()).count();
    if nan > 0 {
        return Err(GcnnError::NanScores {
            count: nan,
            total: scores.len(),
        });
    }
    Ok(scores)
}
