//! Domain models for the biomarker study
//!
//! Source entities (biospecimen results, demographics, visits, genetics)
//! and the merged analysis record built from them.

pub mod biomarker;
pub mod clinical;
pub mod demographics;
pub mod genetic;
pub mod merged;
pub mod types;

// Adapters submodule for source-to-model mapping
pub mod adapters;

// Re-export commonly used types
pub use biomarker::BiomarkerRecord;
pub use clinical::{AgeAtVisit, ClinicalData, ClinicalDiagnosis, MotorAssessment, MotorScore, MotorScores};
pub use demographics::Demographics;
pub use genetic::GeneticProfile;
pub use merged::{ClinicalVariable, MergedDataset, MergedRecord};
pub use types::{Cohort, PatientId, RiskGroup, Sex};
