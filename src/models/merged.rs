//! The merged analysis dataset
//!
//! A `MergedRecord` is one biomarker measurement enriched with the
//! participant's demographics, genetics, mean motor scores, age at
//! collection and composite score. `MergedDataset` owns the rows.

use std::fmt;

use chrono::NaiveDate;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::models::biomarker::BiomarkerRecord;
use crate::models::clinical::{MotorScore, MotorScores};
use crate::models::types::{Cohort, PatientId, RiskGroup, Sex};

/// A biomarker measurement joined with participant attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub biomarker: BiomarkerRecord,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
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
    /// `None` when the participant has no genetic profile
    pub risk_group: Option<RiskGroup>,
    /// Age in years when the sample was analyzed
    pub age_at_biomarker: Option<f64>,
    /// Per-participant mean of each motor score
    pub motor: MotorScores,
    /// PD proteomic score of the (patient, run date) group
    pub pd_pros: Option<f64>,
}

impl MergedRecord {
    /// Wrap a biomarker record with no participant attributes attached yet
    #[must_use]
    pub fn from_biomarker(biomarker: BiomarkerRecord) -> Self {
        Self {
            biomarker,
            sex: None,
            birth_date: None,
            handed: None,
            hisplat: None,
            rawhite: None,
            rablack: None,
            raasian: None,
            apoe: None,
            pathvar_count: None,
            lrrk2: None,
            gba: None,
            snca: None,
            risk_group: None,
            age_at_biomarker: None,
            motor: MotorScores::default(),
            pd_pros: None,
        }
    }

    #[must_use]
    pub fn patno(&self) -> &PatientId {
        &self.biomarker.patno
    }

    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.biomarker.test_name
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.biomarker.value
    }

    #[must_use]
    pub fn cohort(&self) -> Option<Cohort> {
        self.biomarker.cohort
    }

    #[must_use]
    pub fn run_date(&self) -> Option<NaiveDate> {
        self.biomarker.run_date
    }

    /// Value of a clinical (non-assay) variable on this row
    #[must_use]
    pub fn clinical_value(&self, variable: ClinicalVariable) -> Option<f64> {
        match variable {
            ClinicalVariable::Motor(score) => self.motor.get(score),
            ClinicalVariable::AgeAtBiomarker => self.age_at_biomarker,
            ClinicalVariable::CompositeScore => self.pd_pros,
        }
    }
}

/// Row-level numeric variables that are not assay results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClinicalVariable {
    Motor(MotorScore),
    AgeAtBiomarker,
    CompositeScore,
}

impl ClinicalVariable {
    /// Parse a column-style name (`NP3TOT`, `AGE_AT_BIOMARKER`, `PD_PROS`)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(score) = MotorScore::from_column(name) {
            return Some(Self::Motor(score));
        }
        match name.trim().to_uppercase().as_str() {
            "AGE_AT_BIOMARKER" => Some(Self::AgeAtBiomarker),
            "PD_PROS" => Some(Self::CompositeScore),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Motor(score) => score.column(),
            Self::AgeAtBiomarker => "AGE_AT_BIOMARKER",
            Self::CompositeScore => "PD_PROS",
        }
    }
}

impl fmt::Display for ClinicalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The merged dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    records: Vec<MergedRecord>,
    /// Motor score columns that were present in the assessment source
    motor_scores: Vec<MotorScore>,
}

impl MergedDataset {
    #[must_use]
    pub fn new(records: Vec<MergedRecord>, motor_scores: Vec<MotorScore>) -> Self {
        Self {
            records,
            motor_scores,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [MergedRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Motor score columns available for analysis
    #[must_use]
    pub fn motor_scores(&self) -> &[MotorScore] {
        &self.motor_scores
    }

    /// Number of distinct patients
    #[must_use]
    pub fn patient_count(&self) -> usize {
        self.records
            .iter()
            .map(MergedRecord::patno)
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Distinct test names in sorted order
    #[must_use]
    pub fn biomarker_names(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.test_name())
            .unique()
            .sorted()
            .map(str::to_string)
            .collect()
    }

    /// Cohorts present in the data in label order
    #[must_use]
    pub fn cohorts(&self) -> Vec<Cohort> {
        self.records
            .iter()
            .filter_map(MergedRecord::cohort)
            .unique()
            .sorted()
            .collect()
    }

    /// Rows measuring the given biomarker
    pub fn records_for<'a>(&'a self, test_name: &'a str) -> impl Iterator<Item = &'a MergedRecord> {
        self.records.iter().filter(move |r| r.test_name() == test_name)
    }

    /// Keep only the rows the predicate accepts, leaving them unchanged
    #[must_use]
    pub fn retain_where<P>(&self, predicate: P) -> Self
    where
        P: Fn(&MergedRecord) -> bool,
    {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
            motor_scores: self.motor_scores.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(patno: &str, test: &str, cohort: Option<Cohort>) -> MergedRecord {
        let mut biomarker =
            BiomarkerRecord::new(PatientId::parse(patno).unwrap(), test, Some(1.0));
        biomarker.cohort = cohort;
        MergedRecord::from_biomarker(biomarker)
    }

    #[test]
    fn test_dataset_counts() {
        let dataset = MergedDataset::new(
            vec![
                row("1", "NEFL", Some(Cohort::Parkinsons)),
                row("1", "GFAP", Some(Cohort::Parkinsons)),
                row("2", "NEFL", Some(Cohort::HealthyControl)),
                row("3", "NEFL", None),
            ],
            vec![MotorScore::Total],
        );

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.patient_count(), 3);
        assert_eq!(dataset.biomarker_names(), vec!["GFAP", "NEFL"]);
        assert_eq!(
            dataset.cohorts(),
            vec![Cohort::HealthyControl, Cohort::Parkinsons]
        );
        assert_eq!(dataset.records_for("NEFL").count(), 3);
    }

    #[test]
    fn test_clinical_variable_names() {
        assert_eq!(
            ClinicalVariable::from_name("np3tot"),
            Some(ClinicalVariable::Motor(MotorScore::Total))
        );
        assert_eq!(
            ClinicalVariable::from_name("PD_PROS"),
            Some(ClinicalVariable::CompositeScore)
        );
        assert_eq!(ClinicalVariable::from_name("MOCA"), None);
    }
}
