//! Which feature blocks a tabular policy consumes.

use serde::{Deserialize, Serialize};

/// Feature family requested by a tabular policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureFamily {
    /// Aggregated bipartite structure only.
    #[serde(alias = "gcnn_agg")]
    Structural,
    /// Hand-engineered historical statistics only.
    #[serde(alias = "khalil")]
    Historical,
    /// Structural block followed by the historical block.
    #[serde(alias = "all")]
    Both,
}

impl FeatureFamily {
    pub fn uses_structural(self) -> bool {
        matches!(self, Self::Structural | Self::Both)
    }

    pub fn uses_historical(self) -> bool {
        matches!(self, Self::Historical | Self::Both)
    }
}

/// Feature selection and preprocessing flags saved alongside a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    #[serde(alias = "type")]
    pub family: FeatureFamily,
    /// Append pairwise interaction features.
    #[serde(default)]
    pub augment: bool,
    /// Min/max rescale each column over the candidates of a node.
    #[serde(default, alias = "qbnorm")]
    pub bound_normalize: bool,
}

impl FeatureSpec {
    pub fn new(family: FeatureFamily) -> Self {
        Self {
            family,
            augment: false,
            bound_normalize: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_blocks() {
        assert!(FeatureFamily::Structural.uses_structural());
        assert!(!FeatureFamily::Structural.uses_historical());
        assert!(FeatureFamily::Historical.uses_historical());
        assert!(FeatureFamily::Both.uses_structural() && FeatureFamily::Both.uses_historical());
    }

    #[test]
    fn test_legacy_field_names() {
        let spec: FeatureSpec =
            serde_json::from_str(r#"{"type": "khalil", "augment": true, "qbnorm": true}"#).unwrap();
        assert_eq!(spec.family, FeatureFamily::Historical);
        assert!(spec.augment && spec.bound_normalize);

        let spec: FeatureSpec = serde_json::from_str(r#"{"family": "all"}"#).unwrap();
        assert_eq!(spec, FeatureSpec::new(FeatureFamily::Both));
    }
}
