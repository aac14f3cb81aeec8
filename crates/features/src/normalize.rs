//! Feature transforms applied before a tabular model sees its input.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Optional feature augmentation and per-node bound normalization.
///
/// With `augment`, every row `x` is extended by all pairwise products
/// `x_i * x_j` (row-major over `i`, `j`), giving width `n + n * n`. With
/// `bound_normalize`, each column is shifted by its minimum over the rows
/// and divided by the resulting maximum (left alone when that is zero).
pub fn preprocess(features: Array2<f64>, augment: bool, bound_normalize: bool) -> Array2<f64> {
    let mut out = if augment {
        augment_pairwise(&features)
    } else {
        features
    };
    if bound_normalize && out.nrows() > 0 {
        for mut col in out.axis_iter_mut(Axis(1)) {
            let min = col.iter().copied().fold(f64::INFINITY, f64::min);
            col.mapv_inplace(|v| v - min);
            let max = col.iter().copied().fold(0.0_f64, f64::max);
            if max > 0.0 {
                col.mapv_inplace(|v| v / max);
            }
        }
    }
    out
}

fn augment_pairwise(features: &Array2<f64>) -> Array2<f64> {
    let (rows, n) = features.dim();
    let mut out = Array2::zeros((rows, n + n * n));
    for (i, row) in features.axis_iter(Axis(0)).enumerate() {
        let mut dst = out.row_mut(i);
        for (k, &v) in row.iter().enumerate() {
            dst[k] = v;
        }
        for a in 0..n {
            for b in 0..n {
                dst[n + a * n + b] = row[a] * row[b];
            }
        }
    }
    out
}

/// Affine transform fitted offline, applied as `(x - shift) / scale`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaling {
    /// No transform. Used when no scaling was saved with a model.
    #[default]
    Identity,
    PerFeature { shift: Vec<f64>, scale: Vec<f64> },
}

impl FeatureScaling {
    /// Build a per-feature transform, rejecting zero or non-finite scales.
    pub fn per_feature(shift: Vec<f64>, scale: Vec<f64>) -> Result<Self, FeatureError> {
        let scaling = Self::PerFeature { shift, scale };
        scaling.validate()?;
        Ok(scaling)
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if let Self::PerFeature { shift, scale } = self {
            if shift.len() != scale.len() {
                return Err(FeatureError::ScalingLength {
                    shift: shift.len(),
                    scale: scale.len(),
                });
            }
            if let Some((index, &value)) = scale
                .iter()
                .enumerate()
                .find(|(_, v)| **v == 0.0 || !v.is_finite())
            {
                return Err(FeatureError::InvalidScale { index, value });
            }
        }
        Ok(())
    }

    /// Number of features the transform expects, `None` for identity.
    pub fn width(&self) -> Option<usize> {
        match self {
            Self::Identity => None,
            Self::PerFeature { scale, .. } => Some(scale.len()),
        }
    }

    pub fn apply(&self, features: Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        match self {
            Self::Identity => Ok(features),
            Self::PerFeature { shift, scale } => {
                if features.ncols() != scale.len() {
                    return Err(FeatureError::WidthMismatch {
                        expected: scale.len(),
                        found: features.ncols(),
                    });
                }
                let shift = Array1::from_vec(shift.clone());
                let scale = Array1::from_vec(scale.clone());
                Ok((features - &shift) / &scale)
            }
        }
    }
}
