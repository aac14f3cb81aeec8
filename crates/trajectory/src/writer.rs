//! Writes gap trajectories to Parquet files using Arrow.

use crate::types::GapTrajectory;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::path::PathBuf;
use std::sync::Arc;

/// Arrow schema for gap-trace Parquet files (7 columns).
pub fn gap_trace_schema() -> Schema {
    Schema::new(vec![
        Field::new("policy", DataType::Utf8, false),
        Field::new("seed", DataType::UInt64, false),
        Field::new("instance", DataType::Utf8, false),
        Field::new("step", DataType::UInt64, false),
        Field::new("solving_time", DataType::Float64, false),
        Field::new("node_count", DataType::UInt64, false),
        Field::new("gap", DataType::Float64, false),
    ])
}

struct TraceEntry {
    policy: String,
    seed: u64,
    instance: String,
    trajectory: GapTrajectory,
}

/// Buffers gap trajectories and writes them to a Parquet file.
pub struct GapTraceWriter {
    entries: Vec<TraceEntry>,
    output_path: PathBuf,
}

impl GapTraceWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            entries: Vec::new(),
            output_path,
        }
    }

    /// Buffer the trajectory of one solve.
    pub fn record(&mut self, policy: &str, seed: u64, instance: &str, trajectory: GapTrajectory) {
        self.entries.push(TraceEntry {
            policy: policy.to_string(),
            seed,
            instance: instance.to_string(),
            trajectory,
        });
    }

    /// Number of buffered solves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of buffered points.
    pub fn n_points(&self) -> usize {
        self.entries.iter().map(|e| e.trajectory.len()).sum()
    }

    /// Write everything buffered so far, replacing the file. The buffer is
    /// kept, so this can be called after every solve.
    pub fn flush(&self) -> anyhow::Result<PathBuf> {
        let schema = Arc::new(gap_trace_schema());
        let batch = build_record_batch(&self.entries)?;

        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.output_path)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(
            solves = self.entries.len(),
            points = batch.num_rows(),
            path = %self.output_path.display(),
            "Wrote gap-trace Parquet file"
        );
        Ok(self.output_path.clone())
    }

    /// Write all buffered trajectories and return the output path.
    pub fn finish(self) -> anyhow::Result<PathBuf> {
        let path = self.flush()?;
        tracing::info!(
            solves = self.entries.len(),
            points = self.n_points(),
            path = %path.display(),
            "Wrote gap-trace Parquet file"
        );
        Ok(path)
    }
}

/// Build one Arrow RecordBatch, one row per trajectory point.
fn build_record_batch(entries: &[TraceEntry]) -> anyhow::Result<RecordBatch> {
    let schema = Arc::new(gap_trace_schema());

    let mut policies = StringBuilder::new();
    let mut seeds = UInt64Builder::new();
    let mut instances = StringBuilder::new();
    let mut steps = UInt64Builder::new();
    let mut times = Float64Builder::new();
    let mut nodes = UInt64Builder::new();
    let mut gaps = Float64Builder::new();

    for entry in entries {
        for (step, point) in entry.trajectory.points.iter().enumerate() {
            policies.append_value(&entry.policy);
            seeds.append_value(entry.seed);
            instances.append_value(&entry.instance);
            steps.append_value(step as u64);
            times.append_value(point.solving_time);
            nodes.append_value(point.node_count);
            gaps.append_value(point.gap);
        }
    }

    let columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(policies.finish()),
        Arc::new(seeds.finish()),
        Arc::new(instances.finish()),
        Arc::new(steps.finish()),
        Arc::new(times.finish()),
        Arc::new(nodes.finish()),
        Arc::new(gaps.finish()),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressPoint;
    use tempfile::TempDir;

    fn trajectory(n: u64) -> GapTrajectory {
        GapTrajectory {
            points: (1..=n)
                .map(|i| ProgressPoint {
                    solving_time: i as f64 * 0.1,
                    node_count: i,
                    gap: 1.0 / i as f64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_gap_trace_schema_has_7_columns() {
        let schema = gap_trace_schema();
        assert_eq!(schema.fields().len(), 7);
        assert_eq!(schema.field(0).name(), "policy");
        assert_eq!(schema.field(6).name(), "gap");
    }

    #[test]
    fn test_write_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.parquet");
        let writer = GapTraceWriter::new(path.clone());
        assert!(writer.is_empty());
        let result = writer.finish().unwrap();
        assert_eq!(result, path);
        assert!(path.exists());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("setcover").join("gap_node.parquet");
        let mut writer = GapTraceWriter::new(path.clone());
        writer.record("gcnn", 0, "instance_1.lp", trajectory(5));
        writer.record("internal", 0, "instance_1.lp", trajectory(3));
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.n_points(), 8);

        let result = writer.finish().unwrap();
        assert!(result.exists());
        assert!(std::fs::metadata(&result).unwrap().len() > 0);
    }

    #[test]
    fn test_flush_keeps_buffer() {
        let tmp = TempDir::new().unwrap();
        let mut writer = GapTraceWriter::new(tmp.path().join("t.parquet"));
        writer.record("gcnn", 1, "a", trajectory(2));
        writer.flush().unwrap();
        writer.record("gcnn", 2, "a", trajectory(2));
        writer.flush().unwrap();
        assert_eq!(writer.len(), 2);
    }
}
