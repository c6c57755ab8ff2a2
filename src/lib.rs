//! A Rust library for loading, merging and exploring clinical biomarker
//! datasets with cohort filtering, a composite proteomic score and
//! chart-ready analyses.

pub mod algorithm;
pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod models;
pub mod reader;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{DataSource, ExplorerConfig};
pub use error::{BiomarkerError, Result};
pub use loader::{BiomarkerSummary, DatasetLoader};
pub use reader::{Table, read_table};

// Models
pub use models::{
    BiomarkerRecord, ClinicalVariable, Cohort, MergedDataset, MergedRecord, MotorScore, PatientId,
    RiskGroup, Sex,
};

// Scoring and filtering
pub use algorithm::composite_score::{CompositeScorer, PD_PROS_PANEL};
pub use filter::{FilterCriteria, RecordFilter};

// Output
pub use export::export_csv;
