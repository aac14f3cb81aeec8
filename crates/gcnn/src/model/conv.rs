use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

use crate::model::prenorm::{PreNorm, PreNormConfig};

/// Configuration for one bipartite half convolution.
#[derive(Config, Debug)]
pub struct BipartiteConvConfig {
    /// Embedding size of both node sides.
    pub emb_size: usize,
    /// Width of the edge features.
    #[config(default = 1)]
    pub edge_nfeats: usize,
}

/// Half convolution passing messages from a source node set to a target
/// node set along the edges.
///
/// ```text
/// message_e = final(src_lin(src[s_e]) + edge_lin(e) + tgt_lin(tgt[t_e]))
/// agg_t     = post_conv(sum_{e: t_e = t} message_e)
/// out_t     = output(cat[agg_t, tgt_t])
/// ```
#[derive(Module, Debug)]
pub struct BipartiteConv<B: Backend> {
    feature_module_source: Linear<B>,
    feature_module_edge: Linear<B>,
    feature_module_target: Linear<B>,
    final_norm: PreNorm<B>,
    final_linear: Linear<B>,
    post_conv_norm: PreNorm<B>,
    output_hidden: Linear<B>,
    output_linear: Linear<B>,
}

impl BipartiteConvConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BipartiteConv<B> {
        let emb = self.emb_size;
        BipartiteConv {
            feature_module_source: LinearConfig::new(emb, emb).init(device),
            feature_module_edge: LinearConfig::new(self.edge_nfeats, emb)
                .with_bias(false)
                .init(device),
            feature_module_target: LinearConfig::new(emb, emb)
                .with_bias(false)
                .init(device),
            final_norm: PreNormConfig::new(emb).with_shift(false).init(device),
            final_linear: LinearConfig::new(emb, emb).init(device),
            post_conv_norm: PreNormConfig::new(emb).with_shift(false).init(device),
            output_hidden: LinearConfig::new(2 * emb, emb).init(device),
            output_linear: LinearConfig::new(emb, emb).init(device),
        }
    }
}

impl<B: Backend> BipartiteConv<B> {
    /// Update the target embeddings from the source side.
    ///
    /// `source`: `(n_source, emb)`, `target`: `(n_target, emb)`,
    /// `edge_features`: `(n_edges, edge_nfeats)`, index tensors `(n_edges,)`.
    /// Returns `(n_target, emb)`.
    pub fn forward(
        &self,
        source: Tensor<B, 2>,
        target: Tensor<B, 2>,
        edge_source: Tensor<B, 1, Int>,
        edge_target: Tensor<B, 1, Int>,
        edge_features: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let [n_target, emb] = target.dims();
        let device = target.device();

        let joint = self
            .feature_module_source
            .forward(source.select(0, edge_source))
            + self.feature_module_edge.forward(edge_features)
            + self
                .feature_module_target
                .forward(target.clone().select(0, edge_target.clone()));
        let messages = self
            .final_linear
            .forward(relu(self.final_norm.forward(joint)));

        // scatter-sum onto the target nodes
        let aggregated = Tensor::<B, 2>::zeros([n_target, emb], &device).select_assign(
            0,
            edge_target,
            messages,
        );
        let aggregated = self.post_conv_norm.forward(aggregated);

        let x = Tensor::cat(vec![aggregated, target], 1);
        let x = relu(self.output_hidden.forward(x));
        self.output_linear.forward(x)
    }
}
