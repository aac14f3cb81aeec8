use std::path::PathBuf;

use features::FeatureError;

/// Errors from loading or evaluating a tabular model.
#[derive(Debug, thiserror::Error)]
pub enum RankerError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Features(#[from] FeatureError),

    /// Input rows do not have the width the model was trained on.
    #[error("model expects {expected} features, got {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("tree ensemble has no trees")]
    EmptyEnsemble,

    /// A tree references a missing node or feature.
    #[error("tree {tree}, node {node}: {reason}")]
    InvalidTree {
        tree: usize,
        node: usize,
        reason: String,
    },
}
