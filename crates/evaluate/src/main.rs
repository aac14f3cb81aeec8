use std::path::PathBuf;

use burn::backend::ndarray::NdArray;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use evaluate::{aggregate_by_policy, check_policies, load_config};
use trajectory::{read_results, GapTraceReader, GAP_THRESHOLDS};

type CliBackend = NdArray<f32>;

/// branch-eval: compare branching policies on MIP benchmark instances.
#[derive(Parser)]
#[command(name = "branch-eval", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load an evaluation config and build every policy it lists.
    Check {
        /// Path to the evaluation config TOML file.
        #[arg(long, default_value = "configs/evaluate.toml")]
        config: PathBuf,
    },
    /// Print statistics from a gap-trace Parquet file.
    Summary {
        /// Path to the gap-trace Parquet file.
        #[arg(long)]
        input: PathBuf,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
    /// Compare policies across one or more results CSV files.
    Compare {
        /// Paths to results CSV files.
        #[arg(long, required = true, num_args = 1..)]
        results: Vec<PathBuf>,
        /// Output as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn run_check(config: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config)?;
    let registry = config.registry::<CliBackend>(Default::default());
    let failures = check_policies(&config, &registry);

    println!("--- Policy Check ---");
    println!("Problem: {}", config.problem);
    println!("Policies: {}", config.policies.len());
    println!("Instances: {}", config.instances.len());
    println!("Solves: {}", config.n_solves());
    for (label, err) in &failures {
        println!("FAILED {label}: {err}");
    }
    if !failures.is_empty() {
        anyhow::bail!("{} of {} policies failed to build", failures.len(), config.policies.len());
    }
    println!("All policies OK");
    Ok(())
}

fn run_summary(input: PathBuf, json: bool) -> anyhow::Result<()> {
    let summary = GapTraceReader::read_summary(&input)?;
    if json {
        let value = serde_json::json!({
            "file": input.display().to_string(),
            "total_points": summary.total_points,
            "solves": summary.solves,
            "unique_policies": summary.unique_policies,
            "unique_instances": summary.unique_instances,
            "mean_final_gap": summary.mean_final_gap,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!("--- Gap Trace Summary ---");
    println!("File: {}", input.display());
    println!("Total points: {}", summary.total_points);
    println!("Solves: {}", summary.solves);
    println!("Unique policies: {}", summary.unique_policies);
    println!("Unique instances: {}", summary.unique_instances);
    println!("Mean final gap: {:.4}", summary.mean_final_gap);
    Ok(())
}

fn run_compare(results: Vec<PathBuf>, json: bool) -> anyhow::Result<()> {
    let mut records = Vec::new();
    for path in &results {
        let rows = read_results(path)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "Loaded results");
        records.extend(rows);
    }
    let aggregates = aggregate_by_policy(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&aggregates)?);
        return Ok(());
    }

    print!(
        "{:<32} {:>6} {:>10} {:>10} {:>9} {:>9} {:>9}",
        "policy", "solves", "nodes", "fair", "stime", "median", "gap"
    );
    for t in GAP_THRESHOLDS {
        print!(" {:>8}", format!("gap@{t}"));
    }
    println!();
    for agg in &aggregates {
        print!(
            "{:<32} {:>6} {:>10.1} {:>10.1} {:>9.2} {:>9.2} {:>9.4}",
            agg.policy,
            agg.solves,
            agg.mean_nnodes,
            agg.mean_fair_nnodes,
            agg.mean_stime,
            agg.median_stime,
            agg.mean_finalgap
        );
        for (g, n) in agg.mean_threshold_gaps.iter().zip(agg.threshold_solves) {
            if n == 0 {
                print!(" {:>8}", "-");
            } else {
                print!(" {g:>8.4}");
            }
        }
        println!();
        let statuses: Vec<String> = agg
            .status_counts
            .iter()
            .map(|(s, n)| format!("{s}={n}"))
            .collect();
        println!("{:<32} {}", "", statuses.join(" "));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { config } => run_check(config),
        Command::Summary { input, json } => run_summary(input, json),
        Command::Compare { results, json } => run_compare(results, json),
    }
}
