//! Configuration-driven policy construction.

use std::path::PathBuf;

use burn::prelude::Backend;
use features::{FeatureScaling, FeatureSpec};
use gcnn::ModelRegistry;
use ranker::load_model_dir;
use serde::{Deserialize, Serialize};

use crate::error::BranchError;
use crate::policy::{
    BranchingPolicy, NeuralPolicy, PolicyKind, SolverNativePolicy, TabularPolicy,
};

/// One entry of the evaluation's policy list.
///
/// `kind` stays a string so an unknown kind surfaces as
/// [`BranchError::UnknownPolicyKind`] when the policy is built rather than
/// as a parse error of the whole configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDescriptor {
    #[serde(alias = "type")]
    pub kind: String,
    pub name: String,
    /// Parameter file (neural) or model directory (tabular).
    #[serde(default)]
    pub model: Option<PathBuf>,
    /// Registered network architecture; defaults to `name`.
    #[serde(default)]
    pub architecture: Option<String>,
    /// Overrides the model directory's feature spec.
    #[serde(default)]
    pub feature_spec: Option<FeatureSpec>,
    /// Override the model directory's scaling; both or neither.
    #[serde(default)]
    pub shift: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl PolicyDescriptor {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            model: None,
            architecture: None,
            feature_spec: None,
            shift: None,
            scale: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<PathBuf>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn policy_kind(&self) -> Result<PolicyKind, BranchError> {
        self.kind.parse()
    }

    fn model_path(&self) -> Result<&PathBuf, BranchError> {
        self.model.as_ref().ok_or_else(|| BranchError::MissingModel {
            policy: self.name.clone(),
        })
    }

    fn scaling_override(&self) -> Result<Option<FeatureScaling>, BranchError> {
        match (&self.shift, &self.scale) {
            (None, None) => Ok(None),
            (Some(shift), Some(scale)) => Ok(Some(FeatureScaling::per_feature(
                shift.clone(),
                scale.clone(),
            )?)),
            (shift, scale) => Err(features::FeatureError::ScalingLength {
                shift: shift.as_ref().map_or(0, Vec::len),
                scale: scale.as_ref().map_or(0, Vec::len),
            }
            .into()),
        }
    }
}

/// Build the policy a descriptor names, loading its model.
///
/// Neural parameters are loaded through `registry`; tabular models from
/// their model directory.
pub fn build_policy<B: Backend + 'static>(
    descriptor: &PolicyDescriptor,
    registry: &ModelRegistry<B>,
) -> Result<Box<dyn BranchingPolicy>, BranchError> {
    let kind = descriptor.policy_kind()?;
    let name = descriptor.name.as_str();

    let policy: Box<dyn BranchingPolicy> = match kind {
        PolicyKind::SolverNative => Box::new(SolverNativePolicy::new(name)),
        PolicyKind::Neural => {
            let path = descriptor.model_path()?;
            let architecture = descriptor.architecture.as_deref().unwrap_or(name);
            let scorer = registry.load_scorer(architecture, path)?;
            Box::new(NeuralPolicy::new(name, scorer))
        }
        PolicyKind::TabularRanking => {
            let path = descriptor.model_path()?;
            let mut model = load_model_dir(path)?;
            if let Some(spec) = descriptor.feature_spec {
                model.spec = spec;
            }
            if let Some(scaling) = descriptor.scaling_override()? {
                model.scaling = scaling;
            }
            Box::new(TabularPolicy::new(name, model))
        }
    };

    tracing::info!(policy = name, %kind, "built branching policy");
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use features::FeatureFamily;

    type TestBackend = NdArray<f32>;

    fn registry() -> ModelRegistry<TestBackend> {
        ModelRegistry::new(Default::default())
    }

    #[test]
    fn test_native_needs_no_model() {
        let policy = build_policy(&PolicyDescriptor::new("internal", "relpscost"), &registry())
            .unwrap();
        assert_eq!(policy.kind(), PolicyKind::SolverNative);
        assert_eq!(policy.name(), "relpscost");
    }

    #[test]
    fn test_unknown_kind_fails_at_construction() {
        let err = build_policy(&PolicyDescriptor::new("svm", "x"), &registry()).unwrap_err();
        assert!(matches!(err, BranchError::UnknownPolicyKind(ref k) if k == "svm"));
    }

    #[test]
    fn test_learned_policies_need_model() {
        for kind in ["gcnn", "ml-competitor"] {
            let err = build_policy(&PolicyDescriptor::new(kind, "p"), &registry()).unwrap_err();
            assert!(matches!(err, BranchError::MissingModel { .. }), "kind {kind}");
        }
    }

    #[test]
    fn test_neural_unknown_architecture() {
        let desc = PolicyDescriptor::new("gcnn", "baseline").with_model("/nonexistent/params");
        let err = build_policy(&desc, &registry()).unwrap_err();
        assert!(matches!(err, BranchError::Neural(gcnn::GcnnError::UnknownModel(_))));
    }

    #[test]
    fn test_half_scaling_override_rejected() {
        let mut desc = PolicyDescriptor::new("ml-competitor", "p");
        desc.shift = Some(vec![0.0, 1.0]);
        let err = desc.scaling_override().unwrap_err();
        assert!(matches!(
            err,
            BranchError::Features(features::FeatureError::ScalingLength { shift: 2, scale: 0 })
        ));
    }

    #[test]
    fn test_descriptor_json() {
        let json = r#"{
            "type": "ml-competitor",
            "name": "extratrees_gcnn_agg",
            "model": "models/extratrees_gcnn_agg",
            "feature_spec": {"type": "gcnn_agg", "augment": false, "qbnorm": true}
        }"#;
        let desc: PolicyDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.policy_kind().unwrap(), PolicyKind::TabularRanking);
        let spec = desc.feature_spec.unwrap();
        assert_eq!(spec.family, FeatureFamily::Structural);
        assert!(spec.bound_normalize);
        assert!(desc.shift.is_none());
    }
}
