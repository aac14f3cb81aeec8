use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::RankerError;
use crate::model::RankingModel;

/// Linear pairwise ranker: `score = w · x + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRanker {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

impl LinearRanker {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }
}

impl RankingModel for LinearRanker {
    fn n_features(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, RankerError> {
        self.check_width(features)?;
        let w = Array1::from_vec(self.weights.clone());
        Ok(features.dot(&w).iter().map(|v| v + self.bias).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dot_plus_bias() {
        let model = LinearRanker::new(vec![1.0, -2.0], 0.5);
        let scores = model.predict(&array![[1.0, 1.0], [3.0, 0.0]]).unwrap();
        assert_eq!(scores, vec![-0.5, 3.5]);
    }

    #[test]
    fn test_width_checked() {
        let model = LinearRanker::new(vec![1.0; 3], 0.0);
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, RankerError::WidthMismatch { expected: 3, found: 2 }));
    }

    #[test]
    fn test_bias_defaults_to_zero() {
        let model: LinearRanker = serde_json::from_str(r#"{"weights": [0.25]}"#).unwrap();
        assert_eq!(model.bias, 0.0);
    }
}
