//! Graph policy components: pre-normalization layer, bipartite half
//! convolution and the full policy network.

pub mod conv;
pub mod policy;
pub mod prenorm;

pub use conv::{BipartiteConv, BipartiteConvConfig};
pub use policy::{GcnnPolicy, GcnnPolicyConfig};
pub use prenorm::{PreNorm, PreNormConfig};
