use std::fmt::Debug;

use ndarray::Array2;

use crate::error::RankerError;

/// A model producing one score per feature row. Higher is better.
pub trait RankingModel: Debug + Send + Sync {
    /// Input width the model was trained on, if it fixes one.
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, RankerError>;

    /// Fail unless `features` has the trained width.
    fn check_width(&self, features: &Array2<f64>) -> Result<(), RankerError> {
        match self.n_features() {
            Some(expected) if expected != features.ncols() => Err(RankerError::WidthMismatch {
                expected,
                found: features.ncols(),
            }),
            _ => Ok(()),
        }
    }
}
