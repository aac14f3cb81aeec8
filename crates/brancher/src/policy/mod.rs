//! Branching policies: one type per kind behind [`BranchingPolicy`].

pub mod descriptor;
pub mod native;
pub mod neural;
pub mod tabular;

use std::fmt;
use std::str::FromStr;

use features::RootFeatureCache;
use ordered_float::OrderedFloat;

use crate::error::BranchError;
use crate::state::{Candidate, NodeInfo, SearchState};

pub use descriptor::{build_policy, PolicyDescriptor};
pub use native::SolverNativePolicy;
pub use neural::NeuralPolicy;
pub use tabular::TabularPolicy;

/// The closed set of policy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Graph convolution network over the bipartite LP state.
    Neural,
    /// The solver's own branching rule.
    SolverNative,
    /// Ranking/regression model over per-candidate feature rows.
    TabularRanking,
}

impl FromStr for PolicyKind {
    type Err = BranchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neural" | "gcnn" => Ok(Self::Neural),
            "solver-native" | "internal" => Ok(Self::SolverNative),
            "tabular-ranking" | "ml-competitor" => Ok(Self::TabularRanking),
            other => Err(BranchError::UnknownPolicyKind(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neural => write!(f, "neural"),
            Self::SolverNative => write!(f, "solver-native"),
            Self::TabularRanking => write!(f, "tabular-ranking"),
        }
    }
}

/// Result of one decision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Branch on this candidate.
    Branched(Candidate),
    /// Let the solver's built-in rule decide.
    Delegated,
}

/// What a policy sees during one decision call.
pub struct DecisionContext<'a> {
    pub state: &'a dyn SearchState,
    pub node: NodeInfo,
    /// Root-only feature blocks, owned by the controller for one solve.
    pub root_cache: &'a mut RootFeatureCache,
}

/// A branching policy. Implementations choose; the controller executes.
pub trait BranchingPolicy: fmt::Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> PolicyKind;

    fn decide(&self, ctx: &mut DecisionContext<'_>) -> Result<Decision, BranchError>;
}

/// Index of the largest score; ties go to the first occurrence.
///
/// Returns `None` for an empty slice. NaN compares greater than every
/// number, so callers reject NaN first.
pub fn select_best(scores: &[f64]) -> Option<usize> {
    let best = scores.iter().copied().map(OrderedFloat).max()?;
    scores.iter().position(|&s| OrderedFloat(s) == best)
}

/// Validate scores against the candidates and pick the best candidate.
pub(crate) fn choose(
    policy: &str,
    candidates: &[Candidate],
    scores: &[f64],
) -> Result<Candidate, BranchError> {
    if scores.len() != candidates.len() || candidates.is_empty() {
        return Err(BranchError::ScoreCount {
            policy: policy.to_string(),
            expected: candidates.len(),
            found: scores.len(),
        });
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(BranchError::NanScores {
            policy: policy.to_string(),
        });
    }
    let best = select_best(scores).ok_or_else(|| BranchError::ScoreCount {
        policy: policy.to_string(),
        expected: candidates.len(),
        found: 0,
    })?;
    Ok(candidates[best])
}

/// Candidates of the current node, failing when there are none.
pub(crate) fn node_candidates(ctx: &DecisionContext<'_>) -> Result<Vec<Candidate>, BranchError> {
    let candidates = ctx.state.candidates().map_err(BranchError::Solver)?;
    if candidates.is_empty() {
        return Err(BranchError::NoCandidates {
            node: ctx.node.node_count,
        });
    }
    Ok(candidates)
}
