//! Biospecimen assay result model
//!
//! One row of the biospecimen analysis results table: a single test value
//! for a patient, run on a given date, within a study project.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::types::{Cohort, PatientId};

/// A single biomarker measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerRecord {
    /// Patient the sample belongs to
    pub patno: PatientId,
    /// Name of the assay (`TESTNAME`)
    pub test_name: String,
    /// Value exactly as reported (`TESTVALUE`), may be non-numeric ("<LLOQ")
    pub test_value: Option<String>,
    /// Numeric interpretation of `test_value`
    pub value: Option<f64>,
    /// Date the assay was run
    pub run_date: Option<NaiveDate>,
    /// Cohort label as reported by the biospecimen table
    pub cohort_label: Option<String>,
    /// Simplified cohort
    pub cohort: Option<Cohort>,
    /// Study project that produced the measurement
    pub project_id: Option<i64>,
    /// Visit the sample was collected at (`CLINICAL_EVENT`)
    pub clinical_event: Option<String>,
    /// Units of the measurement
    pub units: Option<String>,
}

impl BiomarkerRecord {
    /// Create a record with the given numeric value and no metadata
    #[must_use]
    pub fn new(patno: PatientId, test_name: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            patno,
            test_name: test_name.into(),
            test_value: value.map(|v| v.to_string()),
            value,
            run_date: None,
            cohort_label: None,
            cohort: None,
            project_id: None,
            clinical_event: None,
            units: None,
        }
    }

    /// Whether this record belongs to the biomarker selection
    ///
    /// A record is selected when its test name contains any keyword
    /// (case-insensitive) or its project is one of the focus projects.
    #[must_use]
    pub fn is_selected(&self, keywords_lower: &[String], focus_projects: &[i64]) -> bool {
        let name = self.test_name.to_lowercase();
        keywords_lower.iter().any(|k| name.contains(k.as_str()))
            || self
                .project_id
                .is_some_and(|project| focus_projects.contains(&project))
    }
}
