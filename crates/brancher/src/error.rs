use features::FeatureError;
use gcnn::GcnnError;
use ranker::RankerError;

/// Errors raised while constructing a policy or deciding at a node.
///
/// All of these abort the current solve.
#[derive(Debug, thiserror::Error)]
pub enum BranchError {
    #[error("unknown policy kind '{0}'")]
    UnknownPolicyKind(String),

    /// A learned policy was configured without a model path.
    #[error("policy '{policy}' needs a model path")]
    MissingModel { policy: String },

    #[error("on_node called before on_search_start")]
    NotStarted,

    #[error("no branching candidates at node {node}")]
    NoCandidates { node: u64 },

    /// The scorer returned a different number of scores than candidates.
    #[error("policy '{policy}' returned {found} scores for {expected} candidates")]
    ScoreCount {
        policy: String,
        expected: usize,
        found: usize,
    },

    #[error("policy '{policy}' produced NaN scores")]
    NanScores { policy: String },

    #[error("feature extraction failed: {0}")]
    Features(#[from] FeatureError),

    #[error("neural scorer failed: {0}")]
    Neural(#[from] GcnnError),

    #[error("tabular scorer failed: {0}")]
    Ranker(#[from] RankerError),

    /// The solver accessor failed.
    #[error("solver error: {0}")]
    Solver(#[source] anyhow::Error),
}
