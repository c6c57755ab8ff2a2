//! Biospecimen results to `BiomarkerRecord` adapter

use arrow::record_batch::RecordBatch;

use super::{PATNO, SourceAdapter};
use crate::config::DateFormatConfig;
use crate::error::Result;
use crate::models::biomarker::BiomarkerRecord;
use crate::models::types::{Cohort, PatientId};
use crate::utils::arrow::{parse_date, parse_f64, parse_i64, string_column, value_at};

/// Adapter for the biospecimen analysis results table
#[derive(Debug, Clone, Default)]
pub struct BiomarkerAdapter {
    date_formats: DateFormatConfig,
}

impl BiomarkerAdapter {
    #[must_use]
    pub fn new(date_formats: DateFormatConfig) -> Self {
        Self { date_formats }
    }
}

impl SourceAdapter<BiomarkerRecord> for BiomarkerAdapter {
    fn table_name(&self) -> &str {
        "biomarker"
    }

    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<BiomarkerRecord>> {
        let table = self.table_name();
        let patno = string_column(batch, table, PATNO, true)?;
        let test_name = string_column(batch, table, "TESTNAME", true)?;
        let test_value = string_column(batch, table, "TESTVALUE", false)?;
        let run_date = string_column(batch, table, "RUNDATE", false)?;
        let cohort = string_column(batch, table, "COHORT", false)?;
        let project_id = string_column(batch, table, "PROJECTID", false)?;
        let clinical_event = string_column(batch, table, "CLINICAL_EVENT", false)?;
        let units = string_column(batch, table, "UNITS", false)?;

        let mut records = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let Some(id) = value_at(patno, row).and_then(PatientId::parse) else {
                continue;
            };
            let Some(name) = value_at(test_name, row) else {
                continue;
            };

            let raw_value = value_at(test_value, row);
            let cohort_label = value_at(cohort, row);

            records.push(BiomarkerRecord {
                patno: id,
                test_name: name.to_string(),
                test_value: raw_value.map(str::to_string),
                value: raw_value.and_then(parse_f64),
                run_date: value_at(run_date, row).and_then(|d| parse_date(d, &self.date_formats)),
                cohort_label: cohort_label.map(str::to_string),
                cohort: cohort_label.and_then(Cohort::from_raw_label),
                project_id: value_at(project_id, row).and_then(parse_i64),
                clinical_event: value_at(clinical_event, row).map(str::to_string),
                units: value_at(units, row).map(str::to_string),
            });
        }

        Ok(records)
    }
}
