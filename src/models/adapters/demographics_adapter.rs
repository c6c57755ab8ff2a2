//! Demographics table to `Demographics` adapter

use arrow::record_batch::RecordBatch;

use super::{PATNO, SourceAdapter};
use crate::error::Result;
use crate::models::demographics::Demographics;
use crate::models::types::{PatientId, Sex};
use crate::utils::arrow::{parse_f64, parse_i64, parse_month_year, string_column, value_at};

/// Adapter for the demographics table
#[derive(Debug, Clone, Copy, Default)]
pub struct DemographicsAdapter;

impl SourceAdapter<Demographics> for DemographicsAdapter {
    fn table_name(&self) -> &str {
        "demographics"
    }

    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<Demographics>> {
        let table = self.table_name();
        let patno = string_column(batch, table, PATNO, true)?;
        let sex = string_column(batch, table, "SEX", false)?;
        let birth = string_column(batch, table, "BIRTHDT", false)?;
        let handed = string_column(batch, table, "HANDED", false)?;
        let hisplat = string_column(batch, table, "HISPLAT", false)?;
        let rawhite = string_column(batch, table, "RAWHITE", false)?;
        let rablack = string_column(batch, table, "RABLACK", false)?;
        let raasian = string_column(batch, table, "RAASIAN", false)?;

        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let Some(id) = value_at(patno, row).and_then(PatientId::parse) else {
                continue;
            };

            rows.push(Demographics {
                patno: id,
                sex: value_at(sex, row).and_then(parse_f64).and_then(Sex::from_code),
                birth_date: value_at(birth, row).and_then(parse_month_year),
                handed: value_at(handed, row).and_then(parse_i64),
                hisplat: value_at(hisplat, row).and_then(parse_i64),
                rawhite: value_at(rawhite, row).and_then(parse_i64),
                rablack: value_at(rablack, row).and_then(parse_i64),
                raasian: value_at(raasian, row).and_then(parse_i64),
            });
        }

        Ok(rows)
    }
}
