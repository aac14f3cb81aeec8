use burn::module::Param;
use burn::prelude::*;

/// Configuration for a fixed affine input normalization.
#[derive(Config, Debug)]
pub struct PreNormConfig {
    /// Number of features.
    pub n_units: usize,
    /// Whether a learned shift is applied before scaling.
    #[config(default = true)]
    pub shift: bool,
}

/// Affine normalization `(x + shift) * scale` with parameters fitted before
/// training and stored with the weights.
///
/// Initialized to the identity (shift 0, scale 1).
#[derive(Module, Debug)]
pub struct PreNorm<B: Backend> {
    shift: Option<Param<Tensor<B, 1>>>,
    scale: Param<Tensor<B, 1>>,
}

impl PreNormConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PreNorm<B> {
        let shift = if self.shift {
            Some(Param::from_tensor(Tensor::zeros([self.n_units], device)))
        } else {
            None
        };
        PreNorm {
            shift,
            scale: Param::from_tensor(Tensor::ones([self.n_units], device)),
        }
    }
}

impl<B: Backend> PreNorm<B> {
    /// Input shape `(n, n_units)`, output shape `(n, n_units)`.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = match &self.shift {
            Some(shift) => x + shift.val().unsqueeze::<2>(),
            None => x,
        };
        x * self.scale.val().unsqueeze::<2>()
    }

    /// Number of normalized features.
    pub fn n_units(&self) -> usize {
        self.scale.val().dims()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_identity_at_init() {
        let device = Default::default();
        let norm = PreNormConfig::new(3).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0_f32, -2.0, 3.5, 0.0, 4.0, -1.0], [2, 3]),
            &device,
        );
        let y: Vec<f32> = norm.forward(x).into_data().to_vec().unwrap();
        assert_eq!(y, vec![1.0, -2.0, 3.5, 0.0, 4.0, -1.0]);
        assert_eq!(norm.n_units(), 3);
    }

    #[test]
    fn test_shift_and_scale_broadcast() {
        let device = Default::default();
        let norm = PreNorm::<TestBackend> {
            shift: Some(Param::from_tensor(Tensor::from_data(
                TensorData::from([1.0_f32, -1.0]),
                &device,
            ))),
            scale: Param::from_tensor(Tensor::from_data(TensorData::from([2.0_f32, 0.5]), &device)),
        };
        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0_f32, 3.0, 0.0, 5.0], [2, 2]),
            &device,
        );
        let y: Vec<f32> = norm.forward(x).into_data().to_vec().unwrap();
        assert_eq!(y, vec![4.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_without_shift() {
        let device = Default::default();
        let norm = PreNormConfig::new(4)
            .with_shift(false)
            .init::<TestBackend>(&device);
        assert!(norm.shift.is_none());
        let x = Tensor::<TestBackend, 2>::ones([5, 4], &device);
        assert_eq!(norm.forward(x).dims(), [5, 4]);
    }
}
