//! Clinical visit tables to models: age at visit, diagnosis, MDS-UPDRS III

use arrow::record_batch::RecordBatch;

use super::{PATNO, SourceAdapter};
use crate::error::Result;
use crate::models::clinical::{
    AgeAtVisit, ClinicalDiagnosis, MotorAssessment, MotorScore, MotorScores,
};
use crate::models::types::PatientId;
use crate::utils::arrow::{parse_f64, string_column, value_at};

const EVENT_ID: &str = "EVENT_ID";

/// Adapter for the age-at-visit table
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeAtVisitAdapter;

impl SourceAdapter<AgeAtVisit> for AgeAtVisitAdapter {
    fn table_name(&self) -> &str {
        "age_at_visit"
    }

    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<AgeAtVisit>> {
        let table = self.table_name();
        let patno = string_column(batch, table, PATNO, true)?;
        let event = string_column(batch, table, EVENT_ID, false)?;
        let age = string_column(batch, table, "AGE_AT_VISIT", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let id = value_at(patno, row).and_then(PatientId::parse)?;
                Some(AgeAtVisit {
                    patno: id,
                    event_id: value_at(event, row).map(str::to_string),
                    age_at_visit: value_at(age, row).and_then(parse_f64),
                })
            })
            .collect())
    }
}

/// Adapter for the clinical diagnosis table
#[derive(Debug, Clone, Copy, Default)]
pub struct ClinicalDiagnosisAdapter;

impl SourceAdapter<ClinicalDiagnosis> for ClinicalDiagnosisAdapter {
    fn table_name(&self) -> &str {
        "clinical_diagnosis"
    }

    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<ClinicalDiagnosis>> {
        let table = self.table_name();
        let patno = string_column(batch, table, PATNO, true)?;
        let event = string_column(batch, table, EVENT_ID, false)?;
        let primdiag = string_column(batch, table, "PRIMDIAG", false)?;
        let newdiag = string_column(batch, table, "NEWDIAG", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let id = value_at(patno, row).and_then(PatientId::parse)?;
                Some(ClinicalDiagnosis {
                    patno: id,
                    event_id: value_at(event, row).map(str::to_string),
                    primary_diagnosis: value_at(primdiag, row).map(str::to_string),
                    new_diagnosis: value_at(newdiag, row).map(str::to_string),
                })
            })
            .collect())
    }
}

/// Adapter for the MDS-UPDRS Part III table
///
/// Only the score columns present in the file are read; the others stay
/// `None` on every assessment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotorAssessmentAdapter;

impl SourceAdapter<MotorAssessment> for MotorAssessmentAdapter {
    fn table_name(&self) -> &str {
        "motor_assessment"
    }

    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<MotorAssessment>> {
        let table = self.table_name();
        let patno = string_column(batch, table, PATNO, true)?;
        let event = string_column(batch, table, EVENT_ID, false)?;

        let mut score_columns = Vec::with_capacity(MotorScore::ALL.len());
        for score in MotorScore::ALL {
            if let Some(column) = string_column(batch, table, score.column(), false)? {
                score_columns.push((score, column));
            }
        }

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let id = value_at(patno, row).and_then(PatientId::parse)?;
                let mut scores = MotorScores::default();
                for (score, column) in &score_columns {
                    scores.set(*score, value_at(Some(*column), row).and_then(parse_f64));
                }
                Some(MotorAssessment {
                    patno: id,
                    event_id: value_at(event, row).map(str::to_string),
                    scores,
                })
            })
            .collect())
    }
}
