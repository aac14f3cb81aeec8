//! Feature extraction for learned branching policies.
//!
//! Turns a raw LP snapshot supplied by the solver into the inputs the
//! scorers consume:
//!
//! - [`BipartiteState`]: constraint/edge/variable feature tables used by the
//!   graph network and by the structural aggregate block
//! - [`candidate_structural_features`]: one aggregated row per candidate
//! - [`historical_features`]: hand-engineered statistics, with the
//!   root-only part memoized in a [`RootFeatureCache`]
//! - [`preprocess`] / [`FeatureScaling`]: augmentation, bound normalization
//!   and the affine shift/scale transform
//! - [`FeatureSpec`]: which blocks a tabular policy consumes

pub mod aggregate;
pub mod bipartite;
pub mod error;
pub mod historical;
pub mod normalize;
pub mod snapshot;
pub mod spec;

pub use aggregate::{candidate_structural_features, structural_width};
pub use bipartite::{
    extract_state, guard_incumbent_columns, BipartiteState, N_CONSTRAINT_FEATURES,
    N_EDGE_FEATURES, N_INCUMBENT_COLUMNS, N_VARIABLE_FEATURES,
};
pub use error::FeatureError;
pub use historical::{
    dynamic_features, historical_features, root_static_features, RootFeatureCache, RootFeatureGroup,
    HISTORICAL_WIDTH, N_DYNAMIC_FEATURES, N_ROOT_FEATURES,
};
pub use normalize::{preprocess, FeatureScaling};
pub use snapshot::{BasisStatus, ColumnType, LpColumn, LpRow, LpSnapshot, Nonzero, VariableHistory};
pub use spec::{FeatureFamily, FeatureSpec};
