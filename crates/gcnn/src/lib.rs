//! Graph convolution policy for variable selection.
//!
//! Scores every LP column from the bipartite constraint/variable state with a
//! two-pass graph convolution network (variables to constraints, then back),
//! built on burn. Weights are loaded from burn records; training is done
//! elsewhere.

pub mod bridge;
pub mod error;
pub mod model;
pub mod registry;
pub mod scorer;

pub use bridge::{state_to_tensors, tensor_to_vec, GraphTensors};
pub use error::GcnnError;
pub use model::{GcnnPolicy, GcnnPolicyConfig};
pub use registry::{load_parameters, ModelRegistry};
pub use scorer::{mask_scores, NeuralScorer};
