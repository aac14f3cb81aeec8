//! Regression tree ensembles (extra-trees style averaging and gradient
//! boosted LambdaMART-style sums).

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::RankerError;
use crate::model::RankingModel;

/// One node of a regression tree, stored in a flat array.
///
/// Rows with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Check child indices and feature indices once at load time.
    ///
    /// Children must point forward so traversal always terminates.
    pub fn validate(&self, tree: usize, n_features: Option<usize>) -> Result<(), RankerError> {
        if self.nodes.is_empty() {
            return Err(RankerError::InvalidTree {
                tree,
                node: 0,
                reason: "no nodes".into(),
            });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                for child in [left, right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(RankerError::InvalidTree {
                            tree,
                            node: i,
                            reason: format!("bad child index {child}"),
                        });
                    }
                }
                if let Some(n) = n_features {
                    if feature >= n {
                        return Err(RankerError::InvalidTree {
                            tree,
                            node: i,
                            reason: format!("feature {feature} out of range ({n} features)"),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Largest feature index used by a split, if any.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    /// Leaf value reached by one row. Assumes a validated tree.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// How tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of the trees (randomized trees / random forest).
    Mean,
    /// Learning-rate weighted sum (gradient boosting).
    Sum { learning_rate: f64 },
}

/// Ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<RegressionTree>,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    /// Trained input width; checked on predict when present.
    #[serde(default)]
    pub n_features: Option<usize>,
}

impl TreeEnsemble {
    pub fn validate(&self) -> Result<(), RankerError> {
        if self.trees.is_empty() {
            return Err(RankerError::EmptyEnsemble);
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(t, self.n_features)?;
        }
        Ok(())
    }

    fn required_width(&self) -> usize {
        self.trees
            .iter()
            .filter_map(RegressionTree::max_feature)
            .max()
            .map_or(0, |m| m + 1)
    }
}

impl RankingModel for TreeEnsemble {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, RankerError> {
        self.check_width(features)?;
        let needed = self.required_width();
        if features.ncols() < needed {
            return Err(RankerError::WidthMismatch {
                expected: needed,
                found: features.ncols(),
            });
        }
        let n_trees = self.trees.len() as f64;
        let scores = features
            .rows()
            .into_iter()
            .map(|row| {
                let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                match self.aggregation {
                    Aggregation::Mean => self.base_score + total / n_trees,
                    Aggregation::Sum { learning_rate } => self.base_score + learning_rate * total,
                }
            })
            .collect();
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// x0 <= 0.5 → 1.0, else (x1 <= 2 → 2.0, else 3.0)
    fn stump() -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.5, left: 1, right: 2 },
                TreeNode::Leaf { value: 1.0 },
                TreeNode::Split { feature: 1, threshold: 2.0, left: 3, right: 4 },
                TreeNode::Leaf { value: 2.0 },
                TreeNode::Leaf { value: 3.0 },
            ],
        }
    }

    fn constant(value: f64) -> RegressionTree {
        RegressionTree { nodes: vec![TreeNode::Leaf { value }] }
    }

    #[test]
    fn test_tree_paths() {
        let tree = stump();
        let x = array![[0.5, 9.0], [0.6, 2.0], [0.6, 2.1]];
        let out: Vec<f64> = x.rows().into_iter().map(|r| tree.predict_row(r)).collect();
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_mean_aggregation() {
        let model = TreeEnsemble {
            trees: vec![stump(), constant(5.0)],
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            n_features: None,
        };
        let scores = model.predict(&array![[0.0, 0.0], [1.0, 3.0]]).unwrap();
        assert_eq!(scores, vec![3.0, 4.0]);
    }

    #[test]
    fn test_sum_aggregation() {
        let model = TreeEnsemble {
            trees: vec![stump(), constant(1.0)],
            aggregation: Aggregation::Sum { learning_rate: 0.5 },
            base_score: 1.0,
            n_features: Some(2),
        };
        let scores = model.predict(&array![[1.0, 1.0]]).unwrap();
        assert_eq!(scores, vec![2.5]);
    }

    #[test]
    fn test_narrow_input_rejected() {
        let model = TreeEnsemble {
            trees: vec![stump()],
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            n_features: None,
        };
        let err = model.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, RankerError::WidthMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_validate_rejects_cycles() {
        let tree = RegressionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.0, left: 0, right: 1 },
                TreeNode::Leaf { value: 0.0 },
            ],
        };
        let err = tree.validate(3, None).unwrap_err();
        assert!(matches!(err, RankerError::InvalidTree { tree: 3, node: 0, .. }));
    }

    #[test]
    fn test_validate_feature_range() {
        let err = stump().validate(0, Some(1)).unwrap_err();
        assert!(matches!(err, RankerError::InvalidTree { node: 2, .. }));
    }

    #[test]
    fn test_empty_ensemble() {
        let model = TreeEnsemble {
            trees: vec![],
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            n_features: None,
        };
        assert!(matches!(model.validate(), Err(RankerError::EmptyEnsemble)));
    }

    #[test]
    fn test_untagged_nodes_from_json() {
        let json = r#"{
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"value": -1.0},
                {"value": 1.0}
            ]}],
            "aggregation": {"kind": "sum", "learning_rate": 0.1}
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();
        model.validate().unwrap();
        let scores = model.predict(&array![[2.0]]).unwrap();
        assert!((scores[0] - 0.1).abs() < 1e-12);
    }
}
