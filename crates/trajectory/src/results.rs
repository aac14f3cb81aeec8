//! Per-solve results as CSV.
//!
//! The file is rewritten in full after every solve, so an interrupted run
//! keeps every completed row.

use crate::types::{SolveRecord, SolveStatus, GAP_THRESHOLDS, REPORT_COLUMNS};
use arrow::array::*;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identity columns preceding the report columns.
pub const IDENTITY_COLUMNS: [&str; 4] = ["policy", "seed", "type", "instance"];

fn report_type(column: &str) -> DataType {
    match column {
        "nnodes" | "nlps" | "ndomchgs" | "ncutoffs" => DataType::UInt64,
        "status" => DataType::Utf8,
        _ => DataType::Float64,
    }
}

/// Arrow schema of the results file (20 columns).
pub fn results_schema() -> Schema {
    let mut fields = vec![
        Field::new("policy", DataType::Utf8, false),
        Field::new("seed", DataType::UInt64, false),
        Field::new("type", DataType::Utf8, false),
        Field::new("instance", DataType::Utf8, false),
    ];
    fields.extend(
        REPORT_COLUMNS
            .iter()
            .map(|&c| Field::new(c, report_type(c), false)),
    );
    Schema::new(fields)
}

/// Accumulates solve records and checkpoints them to a CSV file.
pub struct ResultsWriter {
    records: Vec<SolveRecord>,
    output_path: PathBuf,
}

impl ResultsWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            records: Vec::new(),
            output_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    pub fn records(&self) -> &[SolveRecord] {
        &self.records
    }

    /// Append a record and rewrite the file.
    pub fn push(&mut self, record: SolveRecord) -> anyhow::Result<()> {
        self.records.push(record);
        self.checkpoint()
    }

    /// Rewrite the file with every record so far.
    pub fn checkpoint(&self) -> anyhow::Result<()> {
        let batch = build_record_batch(&self.records)?;
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.output_path)?;
        let mut writer = WriterBuilder::new().with_header(true).build(file);
        writer.write(&batch)?;
        tracing::debug!(
            rows = self.records.len(),
            path = %self.output_path.display(),
            "Checkpointed results CSV"
        );
        Ok(())
    }
}

fn build_record_batch(records: &[SolveRecord]) -> anyhow::Result<RecordBatch> {
    let schema = Arc::new(results_schema());

    let policies: StringArray = records.iter().map(|r| Some(r.policy.as_str())).collect();
    let seeds: UInt64Array = records.iter().map(|r| Some(r.seed)).collect();
    let types: StringArray = records.iter().map(|r| Some(r.instance_type.as_str())).collect();
    let instances: StringArray = records.iter().map(|r| Some(r.instance.as_str())).collect();
    let nnodes: UInt64Array = records.iter().map(|r| Some(r.nnodes)).collect();
    let nlps: UInt64Array = records.iter().map(|r| Some(r.nlps)).collect();
    let stimes: Float64Array = records.iter().map(|r| Some(r.stime)).collect();
    let finalgaps: Float64Array = records.iter().map(|r| Some(r.finalgap)).collect();

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(policies),
        Arc::new(seeds),
        Arc::new(types),
        Arc::new(instances),
        Arc::new(nnodes),
        Arc::new(nlps),
        Arc::new(stimes),
        Arc::new(finalgaps),
    ];
    for k in 0..GAP_THRESHOLDS.len() {
        let gaps: Float64Array = records.iter().map(|r| Some(r.threshold_gaps[k])).collect();
        columns.push(Arc::new(gaps));
    }

    let statuses: StringArray = records.iter().map(|r| Some(r.status.to_string())).collect();
    let domchgs: UInt64Array = records.iter().map(|r| Some(r.ndomchgs)).collect();
    let cutoffs: UInt64Array = records.iter().map(|r| Some(r.ncutoffs)).collect();
    let walltimes: Float64Array = records.iter().map(|r| Some(r.walltime)).collect();
    let proctimes: Float64Array = records.iter().map(|r| Some(r.proctime)).collect();
    columns.push(Arc::new(statuses));
    columns.push(Arc::new(domchgs));
    columns.push(Arc::new(cutoffs));
    columns.push(Arc::new(walltimes));
    columns.push(Arc::new(proctimes));

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("Missing column {name}"))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow::anyhow!("Column {name} has unexpected type"))
}

/// Read a results CSV written by [`ResultsWriter`].
pub fn read_results(path: &Path) -> anyhow::Result<Vec<SolveRecord>> {
    let file = std::fs::File::open(path)?;
    let reader = ReaderBuilder::new(Arc::new(results_schema()))
        .with_header(true)
        .build(file)?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let policies = column::<StringArray>(&batch, "policy")?;
        let seeds = column::<UInt64Array>(&batch, "seed")?;
        let types = column::<StringArray>(&batch, "type")?;
        let instances = column::<StringArray>(&batch, "instance")?;
        let nnodes = column::<UInt64Array>(&batch, "nnodes")?;
        let nlps = column::<UInt64Array>(&batch, "nlps")?;
        let stimes = column::<Float64Array>(&batch, "stime")?;
        let finalgaps = column::<Float64Array>(&batch, "finalgap")?;
        let gap_columns = GAP_THRESHOLDS
            .iter()
            .map(|t| column::<Float64Array>(&batch, &format!("{t}_gap")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let statuses = column::<StringArray>(&batch, "status")?;
        let domchgs = column::<UInt64Array>(&batch, "ndomchgs")?;
        let cutoffs = column::<UInt64Array>(&batch, "ncutoffs")?;
        let walltimes = column::<Float64Array>(&batch, "walltime")?;
        let proctimes = column::<Float64Array>(&batch, "proctime")?;

        for i in 0..batch.num_rows() {
            let mut threshold_gaps = [0.0; 7];
            for (k, gaps) in gap_columns.iter().enumerate() {
                threshold_gaps[k] = gaps.value(i);
            }
            records.push(SolveRecord {
                policy: policies.value(i).to_string(),
                seed: seeds.value(i),
                instance_type: types.value(i).to_string(),
                instance: instances.value(i).to_string(),
                nnodes: nnodes.value(i),
                nlps: nlps.value(i),
                stime: stimes.value(i),
                finalgap: finalgaps.value(i),
                threshold_gaps,
                status: SolveStatus::from_str_lossy(statuses.value(i)),
                ndomchgs: domchgs.value(i),
                ncutoffs: cutoffs.value(i),
                walltime: walltimes.value(i),
                proctime: proctimes.value(i),
            });
        }
    }

    tracing::debug!(count = records.len(), path = %path.display(), "Read results CSV");
    Ok(records)
}
