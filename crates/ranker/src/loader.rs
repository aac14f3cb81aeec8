//! Loading a tabular model directory.

use std::path::Path;

use features::{FeatureScaling, FeatureSpec};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RankerError;
use crate::linear::LinearRanker;
use crate::model::RankingModel;
use crate::tree::TreeEnsemble;

pub const MODEL_FILE: &str = "model.json";
pub const FEATURE_SPEC_FILE: &str = "feat_specs.json";
pub const NORMALIZATION_FILE: &str = "normalization.json";

/// On-disk model formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelFile {
    Linear(LinearRanker),
    TreeEnsemble(TreeEnsemble),
}

impl ModelFile {
    pub fn into_model(self) -> Result<Box<dyn RankingModel>, RankerError> {
        match self {
            Self::Linear(m) => Ok(Box::new(m)),
            Self::TreeEnsemble(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
        }
    }
}

/// A loaded tabular policy model with its feature spec and scaling.
#[derive(Debug)]
pub struct TabularModel {
    pub model: Box<dyn RankingModel>,
    pub spec: FeatureSpec,
    pub scaling: FeatureScaling,
}

impl TabularModel {
    pub fn new(model: Box<dyn RankingModel>, spec: FeatureSpec, scaling: FeatureScaling) -> Self {
        Self {
            model,
            spec,
            scaling,
        }
    }

    /// Scale the preprocessed rows and score them.
    pub fn score(&self, features: Array2<f64>) -> Result<Vec<f64>, RankerError> {
        let scaled = self.scaling.apply(features)?;
        self.model.predict(&scaled)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RankerError> {
    let text = std::fs::read_to_string(path).map_err(|source| RankerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RankerError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `model.json`, `feat_specs.json` and, if present,
/// `normalization.json` from `dir`.
///
/// A missing normalization file falls back to the identity transform.
pub fn load_model_dir(dir: &Path) -> Result<TabularModel, RankerError> {
    let model = read_json::<ModelFile>(&dir.join(MODEL_FILE))?.into_model()?;
    let spec: FeatureSpec = read_json(&dir.join(FEATURE_SPEC_FILE))?;

    let norm_path = dir.join(NORMALIZATION_FILE);
    let scaling = if norm_path.exists() {
        let scaling: FeatureScaling = read_json(&norm_path)?;
        scaling.validate()?;
        scaling
    } else {
        tracing::warn!(
            path = %norm_path.display(),
            "no normalization parameters, using identity scaling"
        );
        FeatureScaling::Identity
    };

    if let (Some(model_width), Some(scale_width)) = (model.n_features(), scaling.width()) {
        if model_width != scale_width {
            return Err(RankerError::WidthMismatch {
                expected: model_width,
                found: scale_width,
            });
        }
    }

    tracing::info!(
        dir = %dir.display(),
        family = ?spec.family,
        augment = spec.augment,
        bound_normalize = spec.bound_normalize,
        "loaded tabular model"
    );
    Ok(TabularModel::new(model, spec, scaling))
}
