//! Experiment driver for branching policies.
//!
//! Runs every configured policy on every instance and seed through an
//! external solver, collecting one [`trajectory::SolveRecord`] per solve
//! into a results CSV and the gap trajectories into a Parquet trace.

pub mod config;
pub mod pipeline;
pub mod results;
pub mod session;

pub use config::{load_config, ArchitectureConfig, EvaluationConfig, InstanceSpec};
pub use pipeline::{check_policies, run_evaluation, EvaluationOutput};
pub use results::{aggregate_by_policy, median, PolicyAggregate};
pub use session::{SolveSettings, SolveSummary, SolverFactory, SolverSession};
