//! Tensor bridge: bipartite feature tables (`ndarray`, f64) to burn tensors
//! and logits back to `Vec<f64>`.

use burn::prelude::*;
use burn::tensor::TensorData;
use features::BipartiteState;
use features::N_CONSTRAINT_FEATURES;

use crate::error::GcnnError;

/// Network inputs for one node, on a burn device.
#[derive(Debug, Clone)]
pub struct GraphTensors<B: Backend> {
    pub constraint_features: Tensor<B, 2>,
    pub edge_constraints: Tensor<B, 1, Int>,
    pub edge_variables: Tensor<B, 1, Int>,
    pub edge_features: Tensor<B, 2>,
    pub variable_features: Tensor<B, 2>,
}

fn table_to_tensor<B: Backend>(table: &ndarray::Array2<f64>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = table.dim();
    let flat: Vec<f32> = table.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(flat, [rows, cols]), device)
}

fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let flat: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(flat, [indices.len()]), device)
}

/// Convert a bipartite state to network inputs.
///
/// A problem whose LP has no rows gets a single all-zero constraint that no
/// edge touches, so the constraint embedding always has a row.
pub fn state_to_tensors<B: Backend>(state: &BipartiteState, device: &B::Device) -> GraphTensors<B> {
    let constraint_features = if state.n_constraints() == 0 {
        let width = state.constraint_features.ncols().max(N_CONSTRAINT_FEATURES);
        Tensor::zeros([1, width], device)
    } else {
        table_to_tensor(&state.constraint_features, device)
    };
    GraphTensors {
        constraint_features,
        edge_constraints: index_tensor(&state.edge_constraints, device),
        edge_variables: index_tensor(&state.edge_variables, device),
        edge_features: table_to_tensor(&state.edge_features, device),
        variable_features: table_to_tensor(&state.variable_features, device),
    }
}

/// Read a 1-D tensor back as f64 values.
pub fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 1>) -> Result<Vec<f64>, GcnnError> {
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| GcnnError::Readback(format!("{e:?}")))?;
    Ok(values.into_iter().map(f64::from).collect())
}
