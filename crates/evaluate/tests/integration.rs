//! Integration tests for the evaluation pipeline.
//!
//! A scripted solver replays a fixed node sequence against the controller,
//! so the whole driver runs without a MIP solver.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use burn::backend::ndarray::NdArray;
use tempfile::TempDir;

use brancher::mocks::MockSearchState;
use brancher::{BranchError, BranchingController};
use evaluate::{
    aggregate_by_policy, check_policies, run_evaluation, EvaluationConfig, SolveSettings,
    SolveSummary, SolverFactory, SolverSession,
};
use trajectory::{read_results, GapTraceReader, SolveStatus};

type TestBackend = NdArray<f32>;

/// `(node_count, solving_time, gap)` per decision call.
const SCRIPT: [(u64, f64, f64); 5] = [
    (1, 0.1, 1.0),
    (20, 0.5, 0.8),
    (55, 1.0, 0.6),
    (80, 1.5, 0.3),
    (160, 2.0, 0.1),
];

struct ScriptedSolver {
    n_columns: usize,
    opened: RefCell<Vec<SolveSettings>>,
    /// Per solve: did the controller refuse a node before the search started?
    fresh: Rc<RefCell<Vec<bool>>>,
}

impl ScriptedSolver {
    fn new(n_columns: usize) -> Self {
        Self {
            n_columns,
            opened: RefCell::new(Vec::new()),
            fresh: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

struct ScriptedSession {
    state: MockSearchState,
    fresh: Rc<RefCell<Vec<bool>>>,
}

impl SolverFactory for ScriptedSolver {
    type Session = ScriptedSession;

    fn open(&self, instance: &Path, settings: &SolveSettings) -> anyhow::Result<ScriptedSession> {
        if instance.to_string_lossy().contains("broken") {
            anyhow::bail!("cannot read {}", instance.display());
        }
        self.opened.borrow_mut().push(*settings);
        Ok(ScriptedSession {
            state: MockSearchState::with_columns(self.n_columns),
            fresh: Rc::clone(&self.fresh),
        })
    }
}

impl SolverSession for ScriptedSession {
    fn optimize(&mut self, controller: &mut BranchingController) -> anyhow::Result<SolveSummary> {
        let early = controller.on_node(&mut self.state);
        let refused = matches!(early, Err(BranchError::NotStarted));
        self.fresh
            .borrow_mut()
            .push(refused && controller.trajectory().is_empty());
        controller.on_search_start();
        for (count, time, gap) in SCRIPT {
            self.state.set_node(count, time, gap);
            controller.on_node(&mut self.state)?;
        }
        let (nnodes, stime, final_gap) = SCRIPT[SCRIPT.len() - 1];
        Ok(SolveSummary {
            nnodes,
            nlps: SCRIPT.len() as u64,
            stime,
            final_gap,
            status: SolveStatus::Optimal,
        })
    }
}

/// Linear ranker over the structural block, written as a model directory.
fn write_tabular_model(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let weights: Vec<f64> = (0..37).map(|i| (i % 5) as f64 * 0.1).collect();
    let model = serde_json::json!({"kind": "linear", "weights": weights, "bias": 0.0});
    std::fs::write(dir.join("model.json"), model.to_string()).unwrap();
    std::fs::write(dir.join("feat_specs.json"), r#"{"type": "gcnn_agg"}"#).unwrap();
}

fn config(tmp: &TempDir, instances: &[&str], extra_policies: &str) -> EvaluationConfig {
    let model_dir = tmp.path().join("models/linear");
    write_tabular_model(&model_dir);
    let mut text = format!(
        r#"
problem = "setcover"
time_limit = 60
node_limit = 1000
seeds = [0, 1]
output_dir = "{}"

[[policies]]
kind = "internal"
name = "relpscost"

[[policies]]
kind = "ml-competitor"
name = "linear"
model = "{}"
"#,
        tmp.path().join("results").display(),
        model_dir.display()
    );
    for path in instances {
        text.push_str(&format!("\n[[instances]]\ntype = \"small\"\npath = \"{path}\"\n"));
    }
    text.push_str(extra_policies);
    let config: EvaluationConfig = toml::from_str(&text).unwrap();
    config.validate().unwrap();
    config
}

#[test]
fn test_full_run_writes_results_and_traces() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, &["a.lp", "b.lp"], "");
    let solver = ScriptedSolver::new(4);
    let registry = config.registry::<TestBackend>(Default::default());

    let output = run_evaluation(&config, &solver, &registry, "20231114-221320").unwrap();
    assert_eq!(output.records.len(), 8);
    assert_eq!(
        output.results_path,
        tmp.path().join("results/setcover_20231114-221320_time60.0_nodes1000.csv")
    );

    // identity columns and threshold gaps
    let first = &output.records[0];
    assert_eq!(first.policy, "internal:relpscost");
    assert_eq!(first.seed, 0);
    assert_eq!(first.instance_type, "small");
    assert_eq!(first.instance, "a.lp");
    assert_eq!(first.threshold_gaps, [0.6, 0.3, 0.1, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(first.nnodes, 160);
    assert_eq!(output.records[2].policy, "ml-competitor:linear");

    // solver saw every seed with the configured limits
    let opened = solver.opened.borrow();
    assert_eq!(opened.len(), 8);
    assert!(opened.iter().all(|s| s.time_limit == 60.0 && s.node_limit == 1000));
    assert_eq!(opened[0].seed, 0);
    assert_eq!(opened[1].seed, 1);

    let on_disk = read_results(&output.results_path).unwrap();
    assert_eq!(on_disk, output.records);

    let summary = GapTraceReader::read_summary(&output.gap_trace_path).unwrap();
    assert_eq!(summary.solves, 8);
    assert_eq!(summary.total_points, 8 * SCRIPT.len());
    assert_eq!(summary.unique_policies, 2);
    assert_eq!(summary.unique_instances, 2);
    assert!((summary.mean_final_gap - 0.1).abs() < 1e-9);

    let aggs = aggregate_by_policy(&on_disk);
    assert_eq!(aggs.len(), 2);
    assert!(aggs.iter().all(|a| a.solves == 4));
}

#[test]
fn test_every_solve_gets_a_fresh_controller() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, &["a.lp", "b.lp"], "");
    let solver = ScriptedSolver::new(4);
    let registry = config.registry::<TestBackend>(Default::default());

    let output = run_evaluation(&config, &solver, &registry, "ts").unwrap();

    // 2 instances x 2 policies x 2 seeds, none inheriting an earlier solve
    let fresh = solver.fresh.borrow();
    assert_eq!(fresh.len(), 8);
    assert!(fresh.iter().all(|&f| f), "controller carried over: {fresh:?}");
    for record in &output.records {
        assert_eq!(record.threshold_gaps, [0.6, 0.3, 0.1, 0.0, 0.0, 0.0, 0.0]);
    }
    let summary = GapTraceReader::read_summary(&output.gap_trace_path).unwrap();
    assert_eq!(summary.total_points, 8 * SCRIPT.len());
}

#[test]
fn test_unknown_policy_fails_before_solving() {
    let tmp = TempDir::new().unwrap();
    let extra = "\n[[policies]]\nkind = \"random-forest\"\nname = \"rf\"\n";
    let config = config(&tmp, &["a.lp"], extra);
    let solver = ScriptedSolver::new(4);
    let registry = config.registry::<TestBackend>(Default::default());

    let err = run_evaluation(&config, &solver, &registry, "0").unwrap_err();
    assert!(format!("{err:#}").contains("random-forest"));
    assert!(solver.opened.borrow().is_empty());
    assert!(!config.results_path("0").exists());
}

#[test]
fn test_solve_error_keeps_finished_rows() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, &["a.lp", "broken.lp"], "");
    let solver = ScriptedSolver::new(3);
    let registry = config.registry::<TestBackend>(Default::default());

    let err = run_evaluation(&config, &solver, &registry, "1").unwrap_err();
    assert!(format!("{err:#}").contains("broken.lp"));

    // every solve of the first instance was checkpointed
    let rows = read_results(&config.results_path("1")).unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.instance == "a.lp"));
    let summary = GapTraceReader::read_summary(&config.gap_trace_path()).unwrap();
    assert_eq!(summary.solves, 4);
}

#[test]
fn test_check_reports_unbuildable_policies() {
    let tmp = TempDir::new().unwrap();
    let extra = "\n[[policies]]\nkind = \"gcnn\"\nname = \"baseline\"\n";
    let config = config(&tmp, &["a.lp"], extra);
    let registry = config.registry::<TestBackend>(Default::default());

    let failures = check_policies(&config, &registry);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "gcnn:baseline");
    assert!(matches!(failures[0].1, brancher::BranchError::MissingModel { .. }));
}
