//! Model registry: architectures by model name and parameter loading.
//!
//! Every policy gets its own freshly loaded module, so policies that name
//! the same model never share mutable state.

use std::collections::HashMap;
use std::path::Path;

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};

use crate::error::GcnnError;
use crate::model::{GcnnPolicy, GcnnPolicyConfig};
use crate::scorer::NeuralScorer;

/// Load network parameters saved with [`NamedMpkFileRecorder`].
///
/// Pure: builds a fresh module from `config` and fills it from `path`.
pub fn load_parameters<B: Backend>(
    config: &GcnnPolicyConfig,
    path: &Path,
    device: &B::Device,
) -> Result<GcnnPolicy<B>, GcnnError> {
    config
        .init::<B>(device)
        .load_file(
            path,
            &NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
            device,
        )
        .map_err(|e| GcnnError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Architectures keyed by model name, plus the device models are placed on.
#[derive(Debug)]
pub struct ModelRegistry<B: Backend> {
    architectures: HashMap<String, GcnnPolicyConfig>,
    device: B::Device,
}

impl<B: Backend> ModelRegistry<B> {
    pub fn new(device: B::Device) -> Self {
        Self {
            architectures: HashMap::new(),
            device,
        }
    }

    /// Register (or replace) the architecture for a model name.
    pub fn register(&mut self, name: impl Into<String>, config: GcnnPolicyConfig) {
        self.architectures.insert(name.into(), config);
    }

    pub fn architecture(&self, name: &str) -> Option<&GcnnPolicyConfig> {
        self.architectures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.architectures.contains_key(name)
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Load the parameters at `path` into the architecture registered under
    /// `name` and wrap them in a scorer.
    pub fn load_scorer(&self, name: &str, path: &Path) -> Result<NeuralScorer<B>, GcnnError> {
        let config = self
            .architectures
            .get(name)
            .ok_or_else(|| GcnnError::UnknownModel(name.to_string()))?;
        let model = load_parameters::<B>(config, path, &self.device)?;
        tracing::info!(model = name, path = %path.display(), "loaded graph policy parameters");
        Ok(NeuralScorer::new(model, config.clone(), self.device.clone()))
    }
}
