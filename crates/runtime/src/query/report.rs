//! Rendering of query results for people (tables) and machines (JSON rows).

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub type JsonRow = Map<String, Value>;

/// Arrow's boxed table rendering.
pub fn format_table(batches: &[RecordBatch]) -> Result<String> {
    Ok(arrow::util::pretty::pretty_format_batches(batches)
        .context("Failed to format results")?
        .to_string())
}

/// One JSON object per row, keyed by column name. Null cells are omitted.
pub fn batches_to_json_rows(batches: &[RecordBatch]) -> Result<Vec<JsonRow>> {
    let mut writer = arrow::json::ArrayWriter::new(Vec::new());
    let refs: Vec<&RecordBatch> = batches.iter().collect();
    writer
        .write_batches(&refs)
        .context("Failed to encode results as JSON")?;
    writer.finish().context("Failed to encode results as JSON")?;
    let buf = writer.into_inner();
    serde_json::from_slice(&buf).context("Failed to decode encoded results")
}

/// SHA-256 over the rendered rows.
///
/// Batch boundaries do not affect the fingerprint, only values and row order.
pub fn result_fingerprint(batches: &[RecordBatch]) -> Result<String> {
    let mut hasher = Sha256::new();
    for row in batches_to_json_rows(batches)? {
        hasher.update(serde_json::to_vec(&row)?);
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}
