//! Tabular candidate scorers.
//!
//! A tabular policy scores one feature row per candidate with a ranking or
//! regression model trained offline. Models are stored as a directory:
//!
//! ```text
//! <model dir>/
//!   model.json          linear ranker or tree ensemble
//!   feat_specs.json     feature family + preprocessing flags
//!   normalization.json  optional shift/scale, identity when absent
//! ```

pub mod error;
pub mod linear;
pub mod loader;
pub mod model;
pub mod tree;

pub use error::RankerError;
pub use linear::LinearRanker;
pub use loader::{load_model_dir, ModelFile, TabularModel};
pub use model::RankingModel;
pub use tree::{Aggregation, RegressionTree, TreeEnsemble, TreeNode};
