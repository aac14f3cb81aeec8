//! Evaluation pipeline: instances × policies × seeds.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use burn::prelude::Backend;
use chrono::Local;
use cpu_time::ProcessTime;
use indicatif::{ProgressBar, ProgressStyle};

use brancher::{build_policy, BranchingController, BranchingPolicy, PolicyDescriptor};
use gcnn::ModelRegistry;
use trajectory::{GapTraceWriter, ResultsWriter, SolveRecord};

use crate::config::EvaluationConfig;
use crate::session::{SolveSettings, SolverFactory, SolverSession};

/// Files written by one run and the records in them.
#[derive(Debug)]
pub struct EvaluationOutput {
    pub results_path: PathBuf,
    pub gap_trace_path: PathBuf,
    pub records: Vec<SolveRecord>,
}

/// Local start time as `%Y%m%d-%H%M%S`, used to tell result files apart.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Identity of a policy in the results: `{kind}:{name}`.
pub fn policy_label(descriptor: &PolicyDescriptor) -> String {
    format!("{}:{}", descriptor.kind, descriptor.name)
}

/// Build every configured policy, collecting the failures.
///
/// Returns `(label, error)` for each descriptor that could not be built.
pub fn check_policies<B: Backend + 'static>(
    config: &EvaluationConfig,
    registry: &ModelRegistry<B>,
) -> Vec<(String, brancher::BranchError)> {
    config
        .policies
        .iter()
        .filter_map(|desc| match build_policy(desc, registry) {
            Ok(_) => None,
            Err(e) => Some((policy_label(desc), e)),
        })
        .collect()
}

/// Run every solve the config describes.
///
/// All policies are built before the first solve, so a bad descriptor fails
/// the run immediately. Every solve gets its own [`BranchingController`]
/// around the shared policy. The results CSV is rewritten and the gap trace
/// flushed after every solve. Any solve error aborts the run; what was
/// written up to that point stays on disk.
pub fn run_evaluation<F, B>(
    config: &EvaluationConfig,
    factory: &F,
    registry: &ModelRegistry<B>,
    timestamp: &str,
) -> anyhow::Result<EvaluationOutput>
where
    F: SolverFactory,
    B: Backend + 'static,
{
    let start = Instant::now();

    // 1. Build policies
    let mut policies: Vec<(String, Arc<dyn BranchingPolicy>)> =
        Vec::with_capacity(config.policies.len());
    for desc in &config.policies {
        let label = policy_label(desc);
        let policy = build_policy(desc, registry)
            .with_context(|| format!("building policy {label}"))?;
        policies.push((label, Arc::from(policy)));
    }

    tracing::info!(
        problem = config.problem,
        time_limit = config.time_limit,
        node_limit = config.node_limit,
        solves = config.n_solves(),
        "Starting evaluation"
    );

    // 2. Output files
    let results_path = config.results_path(timestamp);
    let gap_trace_path = config.gap_trace_path();
    let mut results = ResultsWriter::new(results_path.clone());
    let mut traces = GapTraceWriter::new(gap_trace_path.clone());

    let pb = ProgressBar::new(config.n_solves() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("=> "),
    );

    // 3. Solve
    for instance in &config.instances {
        tracing::info!(kind = instance.kind, path = %instance.path.display(), "Instance");
        let instance_name = instance.path.display().to_string();

        for (label, policy) in &policies {
            for &seed in &config.seeds {
                pb.set_message(format!("{label} seed {seed}"));
                let settings = SolveSettings {
                    time_limit: config.time_limit,
                    node_limit: config.node_limit,
                    seed,
                };
                let mut session = factory
                    .open(&instance.path, &settings)
                    .with_context(|| format!("opening {instance_name}"))?;

                let mut controller = BranchingController::with_shared(Arc::clone(policy));
                let wall = Instant::now();
                let proc = ProcessTime::now();
                let summary = session
                    .optimize(&mut controller)
                    .with_context(|| format!("solving {instance_name} with {label} seed {seed}"))?;
                let walltime = wall.elapsed().as_secs_f64();
                let proctime = proc.elapsed().as_secs_f64();

                let stats = controller.stats();
                let record = SolveRecord {
                    policy: label.clone(),
                    seed,
                    instance_type: instance.kind.clone(),
                    instance: instance_name.clone(),
                    nnodes: summary.nnodes,
                    nlps: summary.nlps,
                    stime: summary.stime,
                    finalgap: summary.final_gap,
                    threshold_gaps: stats.threshold_gaps,
                    status: summary.status,
                    ndomchgs: stats.ndomchgs,
                    ncutoffs: stats.ncutoffs,
                    walltime,
                    proctime,
                };

                tracing::info!(
                    policy = %label,
                    seed,
                    nnodes = record.nnodes,
                    fair_nnodes = record.fair_node_count(),
                    nlps = record.nlps,
                    stime = format!("{:.2}", record.stime),
                    walltime = format!("{walltime:.2}"),
                    proctime = format!("{proctime:.2}"),
                    status = %record.status,
                    gap_50 = record.threshold_gaps[0],
                    gap_75 = record.threshold_gaps[1],
                    gap_100 = record.threshold_gaps[2],
                    gap_200 = record.threshold_gaps[4],
                    "Solved"
                );

                traces.record(label, seed, &instance_name, controller.trajectory().clone());
                results.push(record)?;
                traces.flush()?;
                pb.inc(1);
            }
        }
    }

    pb.finish_with_message("done");

    let records = results.records().to_vec();
    let gap_trace_path = traces.finish()?;
    tracing::info!(
        solves = records.len(),
        results = %results_path.display(),
        traces = %gap_trace_path.display(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Evaluation finished"
    );

    Ok(EvaluationOutput {
        results_path,
        gap_trace_path,
        records,
    })
}
