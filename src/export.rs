//! Writing the merged dataset to CSV
//!
//! Rows are flattened into `ExportRow`, converted to a `RecordBatch` with
//! `serde_arrow` and written with the arrow CSV writer. Column names follow
//! the source tables (`PATNO`, `TESTNAME`, ...).

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use arrow::csv::WriterBuilder;
use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::error::util::ensure_directory;
use crate::models::{MergedDataset, MergedRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One merged row with every value as a flat column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExportRow {
    pub patno: String,
    pub testname: String,
    pub testvalue: Option<String>,
    pub testvalue_numeric: Option<f64>,
    pub rundate: Option<String>,
    pub cohort: Option<String>,
    pub cohort_simple: Option<String>,
    pub projectid: Option<i64>,
    pub clinical_event: Option<String>,
    pub units: Option<String>,
    pub sex: Option<String>,
    pub birthdt: Option<String>,
    pub handed: Option<i64>,
    pub hisplat: Option<i64>,
    pub rawhite: Option<i64>,
    pub rablack: Option<i64>,
    pub raasian: Option<i64>,
    pub apoe: Option<String>,
    pub pathvar_count: Option<f64>,
    pub lrrk2: Option<String>,
    pub gba: Option<String>,
    pub snca: Option<String>,
    pub risk_group: Option<String>,
    pub age_at_biomarker: Option<f64>,
    pub np3tot: Option<f64>,
    pub np3brady: Option<f64>,
    pub np3rign: Option<f64>,
    pub np3ptrmr: Option<f64>,
    pub np3ptrml: Option<f64>,
    pub pd_pros: Option<f64>,
}

impl From<&MergedRecord> for ExportRow {
    fn from(record: &MergedRecord) -> Self {
        let biomarker = &record.biomarker;
        Self {
            patno: biomarker.patno.to_string(),
            testname: biomarker.test_name.clone(),
            testvalue: biomarker.test_value.clone(),
            testvalue_numeric: biomarker.value,
            rundate: biomarker.run_date.map(|d| d.format(DATE_FORMAT).to_string()),
            cohort: biomarker.cohort_label.clone(),
            cohort_simple: biomarker.cohort.map(|c| c.label().to_string()),
            projectid: biomarker.project_id,
            clinical_event: biomarker.clinical_event.clone(),
            units: biomarker.units.clone(),
            sex: record.sex.map(|s| s.label().to_string()),
            birthdt: record.birth_date.map(|d| d.format(DATE_FORMAT).to_string()),
            handed: record.handed,
            hisplat: record.hisplat,
            rawhite: record.rawhite,
            rablack: record.rablack,
            raasian: record.raasian,
            apoe: record.apoe.clone(),
            pathvar_count: record.pathvar_count,
            lrrk2: record.lrrk2.clone(),
            gba: record.gba.clone(),
            snca: record.snca.clone(),
            risk_group: record.risk_group.map(|g| g.label().to_string()),
            age_at_biomarker: record.age_at_biomarker,
            np3tot: record.motor.np3tot,
            np3brady: record.motor.np3brady,
            np3rign: record.motor.np3rign,
            np3ptrmr: record.motor.np3ptrmr,
            np3ptrml: record.motor.np3ptrml,
            pd_pros: record.pd_pros,
        }
    }
}

/// Convert the dataset into a single record batch
pub fn to_record_batch(dataset: &MergedDataset) -> Result<RecordBatch> {
    let rows: Vec<ExportRow> = dataset.iter().map(ExportRow::from).collect();

    // Traced from the type so all-missing columns keep a concrete type
    let fields = Vec::<FieldRef>::from_type::<ExportRow>(TracingOptions::default())
        .map_err(|e| anyhow::anyhow!("Schema generation error: {e}"))?;

    serde_arrow::to_record_batch(&fields, &rows)
        .map_err(|e| anyhow::anyhow!("Serialization error: {e}"))
}

/// Write the dataset to `path` as CSV with a header row
///
/// Returns the number of rows written.
pub fn export_csv(dataset: &MergedDataset, path: &Path) -> Result<usize> {
    let start = Instant::now();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent, "export output")?;
    }

    let batch = to_record_batch(dataset)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer
        .write(&batch)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))?;

    log::info!(
        "Wrote {} merged rows to {} in {:?}",
        batch.num_rows(),
        path.display(),
        start.elapsed()
    );
    Ok(batch.num_rows())
}
