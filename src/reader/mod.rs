//! Reading source tables into Arrow record batches.
//!
//! CSV is the primary input format; Parquet copies of the same tables are
//! accepted as well. Whatever the on-disk types, every column comes out as
//! `Utf8` so the adapters can apply one set of coercion rules.

use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::ArrayRef;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::util::safe_open_file;
use crate::error::{BiomarkerError, Result};
use crate::utils::arrow::to_utf8;

/// Default number of rows per record batch
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Batch size override from the environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("BIOMARKER_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|size| *size > 0)
}

/// A source table held as string-typed record batches
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Arc<Schema>,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Build a table from batches that already share `schema`
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Arc<Schema>, batches: Vec<RecordBatch>) -> Self {
        Self {
            name: name.into(),
            schema,
            batches,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.schema.index_of(column).is_ok()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }
}

/// Read a CSV or Parquet file, chosen by extension
///
/// Files without a recognized extension are read as CSV.
pub fn read_table(path: &Path, name: &str) -> Result<Table> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("parquet") | Some("pq") => read_parquet_table(path, name),
        Some("csv") | Some("txt") | None => read_csv_table(path, name),
        Some(_) => Err(BiomarkerError::UnsupportedFormat(path.to_path_buf()).into()),
    }
}

/// Read a CSV file with a header row, typing every column as `Utf8`
///
/// Rows shorter than the header read their missing trailing fields as null.
pub fn read_csv_table(path: &Path, name: &str) -> Result<Table> {
    let mut file = safe_open_file(path, &format!("reading {name} table"))?;

    let format = Format::default()
        .with_header(true)
        .with_truncated_rows(true);
    let (inferred, _) = format
        .infer_schema(&mut file, Some(1))
        .with_context(|| format!("Failed to read CSV header of {}", path.display()))?;
    file.rewind()
        .with_context(|| format!("Failed to rewind {}", path.display()))?;

    let schema = Arc::new(string_schema(&inferred));
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_truncated_rows(true)
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build(file)
        .with_context(|| format!("Failed to build CSV reader for {}", path.display()))?;

    let mut batches = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .with_context(|| format!("Failed to read record batch from {}", path.display()))?;
        if batch.num_rows() > 0 {
            batches.push(batch);
        }
    }

    Ok(Table::new(name, schema, batches))
}

/// Read a Parquet file and cast every column to `Utf8`
pub fn read_parquet_table(path: &Path, name: &str) -> Result<Table> {
    let file = safe_open_file(path, &format!("reading {name} table"))?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()
        .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?;

    let schema = Arc::new(string_schema(reader.schema().as_ref()));
    let mut batches = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .with_context(|| format!("Failed to read record batch from {}", path.display()))?;
        batches.push(stringify_batch(&batch, schema.clone())?);
    }

    Ok(Table::new(name, schema, batches))
}

/// Same field names, every field nullable `Utf8`
fn string_schema(schema: &Schema) -> Schema {
    Schema::new(
        schema
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    )
}

fn stringify_batch(batch: &RecordBatch, schema: Arc<Schema>) -> Result<RecordBatch> {
    let columns = batch
        .columns()
        .iter()
        .map(to_utf8)
        .collect::<Result<Vec<ArrayRef>>>()?;
    RecordBatch::try_new(schema, columns).context("Failed to rebuild record batch as strings")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};
    use std::io::Write;

    #[test]
    fn test_csv_columns_are_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "PATNO,SEX,BIRTHDT").unwrap();
        writeln!(file, "3001,1,07/1948").unwrap();
        writeln!(file, "3002,,01/1950").unwrap();
        drop(file);

        let table = read_table(&path, "demographics").unwrap();
        assert_eq!(table.num_rows(), 2);
        assert!(table.has_column("BIRTHDT"));
        assert_eq!(table.column_names(), vec!["PATNO", "SEX", "BIRTHDT"]);

        let batch = &table.batches()[0];
        let patno = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(patno.value(0), "3001");
        let sex = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(sex.is_null(1) || sex.value(1).is_empty());
    }

    #[test]
    fn test_short_rows_read_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "PATNO,SEX,BIRTHDT\n3001,1\n3002,0,01/1950\n").unwrap();

        let table = read_table(&path, "demographics").unwrap();
        assert_eq!(table.num_rows(), 2);

        let batch = &table.batches()[0];
        let birth = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(birth.is_null(0));
        assert_eq!(birth.value(1), "01/1950");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.xlsx");
        std::fs::write(&path, b"").unwrap();
        assert!(read_table(&path, "x").is_err());
    }
}
