//! TOML config loading for the evaluation driver.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use brancher::PolicyDescriptor;
use burn::prelude::Backend;
use gcnn::{GcnnPolicyConfig, ModelRegistry};
use serde::{Deserialize, Serialize};

fn default_time_limit() -> f64 {
    3600.0
}

fn default_node_limit() -> i64 {
    -1
}

fn default_seeds() -> Vec<u64> {
    vec![0]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

/// Top-level structure of an evaluation config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Problem family, used in output file names.
    pub problem: String,
    /// Per-solve wall-clock limit in seconds, fractions allowed.
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// Per-solve node limit, -1 for none.
    #[serde(default = "default_node_limit")]
    pub node_limit: i64,
    #[serde(default = "default_seeds")]
    pub seeds: Vec<u64>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
    #[serde(default)]
    pub policies: Vec<PolicyDescriptor>,
    /// Graph network architectures keyed by model name.
    #[serde(default)]
    pub architectures: BTreeMap<String, ArchitectureConfig>,
}

/// One problem file and its size class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    #[serde(alias = "type")]
    pub kind: String,
    pub path: PathBuf,
}

fn default_cons_nfeats() -> usize {
    5
}

fn default_edge_nfeats() -> usize {
    1
}

fn default_var_nfeats() -> usize {
    19
}

fn default_emb_size() -> usize {
    64
}

/// Input widths and embedding size of a graph network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    #[serde(default = "default_cons_nfeats")]
    pub cons_nfeats: usize,
    #[serde(default = "default_edge_nfeats")]
    pub edge_nfeats: usize,
    #[serde(default = "default_var_nfeats")]
    pub var_nfeats: usize,
    #[serde(default = "default_emb_size")]
    pub emb_size: usize,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            cons_nfeats: default_cons_nfeats(),
            edge_nfeats: default_edge_nfeats(),
            var_nfeats: default_var_nfeats(),
            emb_size: default_emb_size(),
        }
    }
}

impl ArchitectureConfig {
    pub fn to_policy_config(self) -> GcnnPolicyConfig {
        GcnnPolicyConfig::new()
            .with_cons_nfeats(self.cons_nfeats)
            .with_edge_nfeats(self.edge_nfeats)
            .with_var_nfeats(self.var_nfeats)
            .with_emb_size(self.emb_size)
    }
}

impl EvaluationConfig {
    /// Reject configs that would run no solve at all.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.problem.is_empty() {
            anyhow::bail!("problem name is empty");
        }
        if self.instances.is_empty() {
            anyhow::bail!("no instances configured");
        }
        if self.policies.is_empty() {
            anyhow::bail!("no policies configured");
        }
        if self.seeds.is_empty() {
            anyhow::bail!("no seeds configured");
        }
        if !(self.time_limit.is_finite() && self.time_limit > 0.0) {
            anyhow::bail!("time limit must be positive, got {}", self.time_limit);
        }
        Ok(())
    }

    /// Total number of solves: instances × policies × seeds.
    pub fn n_solves(&self) -> usize {
        self.instances.len() * self.policies.len() * self.seeds.len()
    }

    /// Time limit as it appears in file names: always with a decimal point,
    /// so `3600` reads `3600.0`.
    pub fn time_limit_label(&self) -> String {
        format!("{:?}", self.time_limit)
    }

    /// `{output}/{problem}_{timestamp}_time{limit}_nodes{limit}.csv`
    pub fn results_path(&self, timestamp: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_time{}_nodes{}.csv",
            self.problem,
            timestamp,
            self.time_limit_label(),
            self.node_limit
        ))
    }

    /// `{output}/{problem}/gap_node_{problem}_time_limit_{limit}.parquet`
    pub fn gap_trace_path(&self) -> PathBuf {
        self.output_dir.join(&self.problem).join(format!(
            "gap_node_{}_time_limit_{}.parquet",
            self.problem,
            self.time_limit_label()
        ))
    }

    /// A registry holding every configured architecture.
    pub fn registry<B: Backend>(&self, device: B::Device) -> ModelRegistry<B> {
        let mut registry = ModelRegistry::new(device);
        for (name, arch) in &self.architectures {
            registry.register(name.clone(), arch.to_policy_config());
        }
        registry
    }
}

/// Load and validate an [`EvaluationConfig`] from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<EvaluationConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: EvaluationConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    tracing::info!(
        path = %path.display(),
        problem = config.problem,
        solves = config.n_solves(),
        "Loaded evaluation config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    const FULL: &str = r#"
problem = "setcover"
time_limit = 600
node_limit = 5000
seeds = [0, 1]
output_dir = "out"

[[instances]]
type = "small"
path = "data/instances/setcover/instance_1.lp"

[[instances]]
kind = "big"
path = "data/instances/setcover/instance_2.lp"

[[policies]]
kind = "internal"
name = "relpscost"

[[policies]]
type = "gcnn"
name = "baseline"
model = "trained_models/setcover/baseline/0/best_params.mpk"

[architectures.baseline]
emb_size = 32
"#;

    #[test]
    fn test_deserialize_full_config() {
        let config: EvaluationConfig = toml::from_str(FULL).unwrap();
        assert_eq!(config.time_limit, 600.0);
        assert_eq!(config.node_limit, 5000);
        assert_eq!(config.seeds, vec![0, 1]);
        assert_eq!(config.instances[0].kind, "small");
        assert_eq!(config.instances[1].kind, "big");
        assert_eq!(config.policies[1].kind, "gcnn");
        let arch = config.architectures["baseline"];
        assert_eq!(arch.emb_size, 32);
        assert_eq!(arch.var_nfeats, 19);
        assert_eq!(config.n_solves(), 8);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config: EvaluationConfig = toml::from_str(r#"problem = "indset""#).unwrap();
        assert_eq!(config.time_limit, 3600.0);
        assert_eq!(config.node_limit, -1);
        assert_eq!(config.seeds, vec![0]);
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_paths() {
        let config: EvaluationConfig = toml::from_str(FULL).unwrap();
        assert_eq!(
            config.results_path("20231114-221320"),
            PathBuf::from("out/setcover_20231114-221320_time600.0_nodes5000.csv")
        );
        assert_eq!(
            config.gap_trace_path(),
            PathBuf::from("out/setcover/gap_node_setcover_time_limit_600.0.parquet")
        );
    }

    #[test]
    fn test_fractional_time_limit() {
        let text = FULL.replace("time_limit = 600", "time_limit = 90.5");
        let mut config: EvaluationConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.time_limit, 90.5);
        assert_eq!(
            config.results_path("ts"),
            PathBuf::from("out/setcover_ts_time90.5_nodes5000.csv")
        );
        config.validate().unwrap();

        config.time_limit = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_has_architectures() {
        let config: EvaluationConfig = toml::from_str(FULL).unwrap();
        let registry = config.registry::<NdArray<f32>>(Default::default());
        assert!(registry.contains("baseline"));
        assert_eq!(registry.architecture("baseline").unwrap().emb_size, 32);
        assert!(!registry.contains("relpscost"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/eval.toml")).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
