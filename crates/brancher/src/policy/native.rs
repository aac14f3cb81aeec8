use crate::error::BranchError;
use crate::policy::{BranchingPolicy, Decision, DecisionContext, PolicyKind};

/// Hands every decision back to the solver's built-in rule.
///
/// Does no feature extraction, so it also serves as the baseline for
/// overhead measurements.
#[derive(Debug, Clone)]
pub struct SolverNativePolicy {
    name: String,
}

impl SolverNativePolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BranchingPolicy for SolverNativePolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::SolverNative
    }

    fn decide(&self, _ctx: &mut DecisionContext<'_>) -> Result<Decision, BranchError> {
        Ok(Decision::Delegated)
    }
}
