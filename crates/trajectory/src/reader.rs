//! Reads gap traces back from Parquet files.

use crate::types::{GapTraceRow, GapTraceSummary, GapTrajectory, ProgressPoint};
use arrow::array::*;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Static methods for reading gap-trace Parquet files.
pub struct GapTraceReader;

impl GapTraceReader {
    /// Read every stored point.
    pub fn read_all(path: &Path) -> anyhow::Result<Vec<GapTraceRow>> {
        let file = std::fs::File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut rows = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            let mut batch_rows = extract_rows_from_batch(&batch)?;
            rows.append(&mut batch_rows);
        }

        tracing::debug!(count = rows.len(), path = %path.display(), "Read gap-trace rows");
        Ok(rows)
    }

    /// Read points from several files.
    pub fn read_multiple(paths: &[PathBuf]) -> anyhow::Result<Vec<GapTraceRow>> {
        let mut all_rows = Vec::new();
        for path in paths {
            let mut rows = Self::read_all(path)?;
            all_rows.append(&mut rows);
        }
        Ok(all_rows)
    }

    /// Reassemble the trajectory of one solve, ordered by step.
    pub fn read_trajectory(
        path: &Path,
        policy: &str,
        seed: u64,
        instance: &str,
    ) -> anyhow::Result<GapTrajectory> {
        let mut rows: Vec<GapTraceRow> = Self::read_all(path)?
            .into_iter()
            .filter(|r| r.policy == policy && r.seed == seed && r.instance == instance)
            .collect();
        rows.sort_by_key(|r| r.step);
        Ok(GapTrajectory {
            points: rows.into_iter().map(|r| r.point).collect(),
        })
    }

    /// Compute summary statistics from a gap-trace file.
    pub fn read_summary(path: &Path) -> anyhow::Result<GapTraceSummary> {
        let rows = Self::read_all(path)?;

        let mut policies = HashSet::new();
        let mut instances = HashSet::new();
        // last point per solve
        let mut last: BTreeMap<(String, u64, String), (u64, f64)> = BTreeMap::new();

        for row in &rows {
            policies.insert(row.policy.clone());
            instances.insert(row.instance.clone());
            let key = (row.policy.clone(), row.seed, row.instance.clone());
            let entry = last.entry(key).or_insert((row.step, row.point.gap));
            if row.step >= entry.0 {
                *entry = (row.step, row.point.gap);
            }
        }

        let mean_final_gap = if last.is_empty() {
            0.0
        } else {
            last.values().map(|(_, g)| g).sum::<f64>() / last.len() as f64
        };

        Ok(GapTraceSummary {
            total_points: rows.len(),
            solves: last.len(),
            unique_policies: policies.len(),
            unique_instances: instances.len(),
            mean_final_gap,
        })
    }
}

/// Extract gap-trace rows from a single Arrow RecordBatch.
fn extract_rows_from_batch(batch: &RecordBatch) -> anyhow::Result<Vec<GapTraceRow>> {
    let policies = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow::anyhow!("Column 0 (policy) is not StringArray"))?;

    let seeds = batch
        .column(1)
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| anyhow::anyhow!("Column 1 (seed) is not UInt64Array"))?;

    let instances = batch
        .column(2)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow::anyhow!("Column 2 (instance) is not StringArray"))?;

    let steps = batch
        .column(3)
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| anyhow::anyhow!("Column 3 (step) is not UInt64Array"))?;

    let times = batch
        .column(4)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| anyhow::anyhow!("Column 4 (solving_time) is not Float64Array"))?;

    let nodes = batch
        .column(5)
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| anyhow::anyhow!("Column 5 (node_count) is not UInt64Array"))?;

    let gaps = batch
        .column(6)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| anyhow::anyhow!("Column 6 (gap) is not Float64Array"))?;

    let rows = (0..batch.num_rows())
        .map(|i| GapTraceRow {
            policy: policies.value(i).to_string(),
            seed: seeds.value(i),
            instance: instances.value(i).to_string(),
            step: steps.value(i),
            point: ProgressPoint {
                solving_time: times.value(i),
                node_count: nodes.value(i),
                gap: gaps.value(i),
            },
        })
        .collect();
    Ok(rows)
}
