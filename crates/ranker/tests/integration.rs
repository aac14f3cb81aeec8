//! Integration tests for the ranker crate: model directories on disk feeding
//! the feature preprocessing pipeline.

use ndarray::array;
use tempfile::TempDir;

use features::{preprocess, FeatureFamily, FeatureScaling};
use ranker::{
    load_model_dir, Aggregation, ModelFile, RankingModel, RegressionTree, TreeEnsemble, TreeNode,
};

fn write_json<T: serde::Serialize>(dir: &std::path::Path, name: &str, value: &T) {
    let text = serde_json::to_string_pretty(value).unwrap();
    std::fs::write(dir.join(name), text).unwrap();
}

#[test]
fn test_tree_ensemble_dir_with_augmentation() {
    let tmp = TempDir::new().unwrap();

    // two raw features → 2 + 4 augmented columns; split on x0 * x1 (column 3)
    let tree = RegressionTree {
        nodes: vec![
            TreeNode::Split {
                feature: 3,
                threshold: 0.5,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { value: 0.0 },
            TreeNode::Leaf { value: 1.0 },
        ],
    };
    let model = ModelFile::TreeEnsemble(TreeEnsemble {
        trees: vec![tree.clone(), tree],
        aggregation: Aggregation::Mean,
        base_score: 0.0,
        n_features: Some(6),
    });
    write_json(tmp.path(), "model.json", &model);
    std::fs::write(
        tmp.path().join("feat_specs.json"),
        r#"{"family": "structural", "augment": true, "bound_normalize": false}"#,
    )
    .unwrap();
    write_json(
        tmp.path(),
        "normalization.json",
        &FeatureScaling::per_feature(vec![0.0; 6], vec![1.0; 6]).unwrap(),
    );

    let loaded = load_model_dir(tmp.path()).unwrap();
    assert_eq!(loaded.spec.family, FeatureFamily::Structural);

    let raw = array![[0.1, 0.2], [1.0, 1.0], [0.9, 0.1]];
    let rows = preprocess(raw, loaded.spec.augment, loaded.spec.bound_normalize);
    let scores = loaded.score(rows).unwrap();
    assert_eq!(scores, vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_linear_model_round_trips_through_serde() {
    let tmp = TempDir::new().unwrap();
    write_json(
        tmp.path(),
        "model.json",
        &ModelFile::Linear(ranker::LinearRanker::new(vec![0.5, -0.5], 0.0)),
    );
    std::fs::write(tmp.path().join("feat_specs.json"), r#"{"type": "all"}"#).unwrap();

    let loaded = load_model_dir(tmp.path()).unwrap();
    assert_eq!(loaded.spec.family, FeatureFamily::Both);
    assert_eq!(loaded.model.n_features(), Some(2));
    assert_eq!(loaded.score(array![[4.0, 2.0]]).unwrap(), vec![1.0]);
}
