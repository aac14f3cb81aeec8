//! Optimality-gap progress data for branching evaluations.
//!
//! Provides the in-memory types recorded during one solve (gap trajectory,
//! node-threshold snapshot, per-solve record) and their storage: gap traces
//! as Parquet, per-solve results as CSV.

pub mod reader;
pub mod results;
pub mod types;
pub mod writer;

pub use reader::GapTraceReader;
pub use results::{read_results, ResultsWriter};
pub use types::{
    GapSnapshot, GapTraceRow, GapTraceSummary, GapTrajectory, ProgressPoint, SolveRecord,
    SolveStatus, GAP_THRESHOLDS, REPORT_COLUMNS,
};
pub use writer::GapTraceWriter;
