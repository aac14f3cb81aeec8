use features::FeatureError;

/// Errors from building, loading or running the graph policy.
#[derive(Debug, thiserror::Error)]
pub enum GcnnError {
    #[error("feature extraction failed: {0}")]
    Features(#[from] FeatureError),

    /// No architecture is registered under this model name.
    #[error("no architecture registered for model '{0}'")]
    UnknownModel(String),

    #[error("failed to load parameters from {path}: {message}")]
    Load { path: String, message: String },

    /// Table width does not match the configured input width.
    #[error("{table} features have width {found}, model expects {expected}")]
    InputWidth {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("candidate LP position {index} out of range ({len} variables)")]
    CandidateOutOfRange { index: usize, len: usize },

    /// The network produced NaN for at least one candidate.
    #[error("network produced NaN for {count} of {total} candidates")]
    NanScores { count: usize, total: usize },

    #[error("tensor readback failed: {0}")]
    Readback(String),
}
