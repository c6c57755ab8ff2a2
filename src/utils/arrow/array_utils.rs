//! Utilities for working with Arrow arrays.
//!
//! Every column handed to the adapters has been normalized to `Utf8` by the
//! reader, so access boils down to finding the column and downcasting it to
//! a `StringArray`.

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::warn;

use crate::error::{BiomarkerError, Result};

/// Get a column from a record batch by name
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `table` - Name of the source table (for error messages)
/// * `column_name` - The name of the column to extract
/// * `required` - Whether the column is required (error if missing) or optional (None if missing)
pub fn get_column<'a>(
    batch: &'a RecordBatch,
    table: &str,
    column_name: &str,
    required: bool,
) -> Result<Option<&'a ArrayRef>> {
    match batch.schema().index_of(column_name) {
        Ok(idx) => Ok(Some(batch.column(idx))),
        Err(_) if required => Err(BiomarkerError::ColumnNotFound {
            table: table.to_string(),
            column: column_name.to_string(),
        }
        .into()),
        Err(_) => Ok(None),
    }
}

/// Get a column as a `StringArray`
pub fn string_column<'a>(
    batch: &'a RecordBatch,
    table: &str,
    column_name: &str,
    required: bool,
) -> Result<Option<&'a StringArray>> {
    let Some(array) = get_column(batch, table, column_name, required)? else {
        return Ok(None);
    };

    match array.as_any().downcast_ref::<StringArray>() {
        Some(strings) => Ok(Some(strings)),
        None => {
            warn!(
                "Column '{column_name}' in {table} is {:?}, expected Utf8; ignoring it",
                array.data_type()
            );
            if required {
                anyhow::bail!("Column '{column_name}' in {table} is not a string column");
            }
            Ok(None)
        }
    }
}

/// Trimmed, non-empty string value at `row`
#[must_use]
pub fn value_at(array: Option<&StringArray>, row: usize) -> Option<&str> {
    let array = array?;
    if row >= array.len() || array.is_null(row) {
        return None;
    }
    let value = array.value(row).trim();
    (!value.is_empty()).then_some(value)
}

/// Cast any column to `Utf8`, leaving string columns untouched
pub fn to_utf8(array: &ArrayRef) -> Result<ArrayRef> {
    if array.data_type() == &DataType::Utf8 {
        return Ok(array.clone());
    }
    Ok(cast(array, &DataType::Utf8)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        let schema = Schema::new(vec![Field::new("PATNO", DataType::Utf8, true)]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec![Some("3001"), Some("  "), None]))],
        )
        .unwrap()
    }

    #[test]
    fn test_required_column_missing() {
        let batch = batch();
        assert!(get_column(&batch, "demographics", "SEX", true).is_err());
        assert!(get_column(&batch, "demographics", "SEX", false).unwrap().is_none());
    }

    #[test]
    fn test_value_at_skips_blank_and_null() {
        let batch = batch();
        let patno = string_column(&batch, "t", "PATNO", true).unwrap();
        assert_eq!(value_at(patno, 0), Some("3001"));
        assert_eq!(value_at(patno, 1), None);
        assert_eq!(value_at(patno, 2), None);
        assert_eq!(value_at(patno, 9), None);
    }

    #[test]
    fn test_to_utf8_casts_integers() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(7), None]));
        let strings = to_utf8(&ints).unwrap();
        let strings = strings.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(strings.value(0), "7");
        assert!(strings.is_null(1));
    }
}
