use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

use crate::model::conv::{BipartiteConv, BipartiteConvConfig};
use crate::model::prenorm::{PreNorm, PreNormConfig};

/// Configuration for the graph convolution branching policy.
///
/// ```text
/// constraints (n_c, cons_nfeats) ─ PreNorm → Linear → ReLU → Linear → ReLU ─┐
/// edges       (n_e, edge_nfeats) ─ PreNorm ─────────────────────────────────┤
/// variables   (n_v, var_nfeats)  ─ PreNorm → Linear → ReLU → Linear → ReLU ─┤
///                                                                           │
///   v→c convolution (update constraints), then c→v (update variables)       │
///   variables → Linear → ReLU → Linear(no bias) → logits (n_v,)  ◄──────────┘
/// ```
#[derive(Config, Debug)]
pub struct GcnnPolicyConfig {
    #[config(default = 5)]
    pub cons_nfeats: usize,
    #[config(default = 1)]
    pub edge_nfeats: usize,
    #[config(default = 19)]
    pub var_nfeats: usize,
    /// Embedding size shared by constraint and variable nodes.
    #[config(default = 64)]
    pub emb_size: usize,
}

/// Two-layer ReLU embedding with input pre-normalization.
#[derive(Module, Debug)]
pub struct NodeEmbedding<B: Backend> {
    norm: PreNorm<B>,
    linear1: Linear<B>,
    linear2: Linear<B>,
}

impl<B: Backend> NodeEmbedding<B> {
    fn new(n_in: usize, emb: usize, device: &B::Device) -> Self {
        Self {
            norm: PreNormConfig::new(n_in).init(device),
            linear1: LinearConfig::new(n_in, emb).init(device),
            linear2: LinearConfig::new(emb, emb).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.linear1.forward(self.norm.forward(x)));
        relu(self.linear2.forward(x))
    }
}

/// Bipartite graph convolution policy producing one logit per LP column.
#[derive(Module, Debug)]
pub struct GcnnPolicy<B: Backend> {
    cons_embedding: NodeEmbedding<B>,
    edge_embedding: PreNorm<B>,
    var_embedding: NodeEmbedding<B>,
    conv_v_to_c: BipartiteConv<B>,
    conv_c_to_v: BipartiteConv<B>,
    output_hidden: Linear<B>,
    output_linear: Linear<B>,
}

impl GcnnPolicyConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GcnnPolicy<B> {
        let emb = self.emb_size;
        GcnnPolicy {
            cons_embedding: NodeEmbedding::new(self.cons_nfeats, emb, device),
            edge_embedding: PreNormConfig::new(self.edge_nfeats).init(device),
            var_embedding: NodeEmbedding::new(self.var_nfeats, emb, device),
            conv_v_to_c: BipartiteConvConfig::new(emb)
                .with_edge_nfeats(self.edge_nfeats)
                .init(device),
            conv_c_to_v: BipartiteConvConfig::new(emb)
                .with_edge_nfeats(self.edge_nfeats)
                .init(device),
            output_hidden: LinearConfig::new(emb, emb).init(device),
            output_linear: LinearConfig::new(emb, 1).with_bias(false).init(device),
        }
    }
}

impl<B: Backend> GcnnPolicy<B> {
    /// Forward pass over one bipartite graph.
    ///
    /// Edge index tensors hold the constraint and variable endpoint of each
    /// edge. With no edges the convolutions are skipped and the logits come
    /// from the variable embeddings alone.
    ///
    /// Output shape: `(n_variables,)`
    pub fn forward(
        &self,
        constraint_features: Tensor<B, 2>,
        edge_constraints: Tensor<B, 1, Int>,
        edge_variables: Tensor<B, 1, Int>,
        edge_features: Tensor<B, 2>,
        variable_features: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let n_edges = edge_constraints.dims()[0];

        let constraints = self.cons_embedding.forward(constraint_features);
        let variables = self.var_embedding.forward(variable_features);

        let variables = if n_edges == 0 {
            variables
        } else {
            let edges = self.edge_embedding.forward(edge_features);
            let constraints = self.conv_v_to_c.forward(
                variables.clone(),
                constraints,
                edge_variables.clone(),
                edge_constraints.clone(),
                edges.clone(),
            );
            self.conv_c_to_v.forward(
                constraints,
                variables,
                edge_constraints,
                edge_variables,
                edges,
            )
        };

        let x = relu(self.output_hidden.forward(variables));
        self.output_linear.forward(x).squeeze::<1>(1)
    }
}
