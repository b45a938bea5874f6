//! Parquet writer for crawled tables.
//!
//! Upstream result sets are untyped JSON, so each column's Arrow type is
//! inferred from its non-null values:
//! - only booleans → `Boolean`
//! - only integers → `Int64`
//! - integers and/or floats → `Float64`
//! - anything else (or all null) → `Utf8`, non-string values rendered as JSON
//!
//! All fields are nullable. Pages are gzip-compressed.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::TableSink;
use crate::models::Table;

/// Writes each table as a single-row-group Parquet file.
#[derive(Debug, Clone, Default)]
pub struct ParquetSink;

impl ParquetSink {
    pub fn new() -> Self {
        ParquetSink
    }
}

#[async_trait]
impl TableSink for ParquetSink {
    async fn write_table(&self, path: &Path, table: Table) -> Result<()> {
        let rows = table.len();
        // Encoding is CPU work; keep it off the async workers.
        let bytes = tokio::task::spawn_blocking(move || encode_table(&table))
            .await
            .context("parquet encoder task panicked")??;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Write then rename so an interrupted run never leaves a truncated artifact.
        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        if let Err(e) = write_and_rename(&partial, path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", partial.display(), cleanup);
                }
            }
            return Err(e);
        }

        debug!("Wrote {} rows ({} bytes) to {}", rows, bytes.len(), path.display());
        Ok(())
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

async fn write_and_rename(partial: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(partial, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tokio::fs::rename(partial, path)
        .await
        .with_context(|| format!("Failed to move artifact into {}", path.display()))
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::GZIP(GzipLevel::default()))
        .set_created_by(format!("nba-crawler {}", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Encode a table into an in-memory Parquet file.
pub fn encode_table(table: &Table) -> Result<Vec<u8>> {
    let batch = to_record_batch(table)?;
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(writer_properties()))
        .context("parquet writer init failed")?;
    writer.write(&batch).context("parquet write failed")?;
    writer.close().context("parquet close failed")?;
    Ok(buf)
}

/// Convert a row-oriented table into one Arrow record batch.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    if table.columns.is_empty() {
        anyhow::bail!("cannot encode a table with no columns");
    }

    let mut fields = Vec::with_capacity(table.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());

    for (idx, name) in table.columns.iter().enumerate() {
        let values: Vec<&Value> = table.rows.iter().map(|row| &row[idx]).collect();
        let data_type = infer_type(&values);
        arrays.push(build_array(&data_type, &values));
        fields.push(Field::new(name.as_str(), data_type, true));
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays).context("failed to assemble record batch")
}

fn infer_type(values: &[&Value]) -> DataType {
    let mut seen_bool = false;
    let mut seen_int = false;
    let mut seen_float = false;
    let mut seen_other = false;

    for v in values {
        match v {
            Value::Null => {}
            Value::Bool(_) => seen_bool = true,
            Value::Number(n) if n.is_i64() => seen_int = true,
            Value::Number(_) => seen_float = true,
            _ => seen_other = true,
        }
    }

    let numeric = seen_int || seen_float;
    match (seen_other, seen_bool, numeric) {
        (false, true, false) => DataType::Boolean,
        (false, false, true) if seen_float => DataType::Float64,
        (false, false, true) => DataType::Int64,
        _ => DataType::Utf8,
    }
}

fn build_array(data_type: &DataType, values: &[&Value]) -> ArrayRef {
    match data_type {
        DataType::Boolean => Arc::new(BooleanArray::from(
            values.iter().map(|v| v.as_bool()).collect::<Vec<_>>(),
        )),
        DataType::Int64 => Arc::new(Int64Array::from(
            values.iter().map(|v| v.as_i64()).collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.iter().map(|v| v.as_f64()).collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values.iter().map(|v| render_string(v)).collect::<Vec<_>>(),
        )),
    }
}

fn render_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
