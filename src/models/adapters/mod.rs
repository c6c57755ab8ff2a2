//! Source-to-Model Adapters
//!
//! Adapters map the string-typed record batches of a source table to the
//! domain models. Rows without a usable patient identifier are skipped.

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::reader::Table;

pub mod biomarker_adapter;
pub mod clinical_adapter;
pub mod demographics_adapter;
pub mod genetic_adapter;

pub use biomarker_adapter::BiomarkerAdapter;
pub use clinical_adapter::{AgeAtVisitAdapter, ClinicalDiagnosisAdapter, MotorAssessmentAdapter};
pub use demographics_adapter::DemographicsAdapter;
pub use genetic_adapter::GeneticAdapter;

/// Column holding the patient identifier in every source
pub const PATNO: &str = "PATNO";

/// Defines the interface for source-to-model adapters
pub trait SourceAdapter<T> {
    /// Name of the source table, used in error messages
    fn table_name(&self) -> &str;

    /// Convert one `RecordBatch` into domain model objects
    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<T>>;

    /// Apply additional transformations after all batches are converted
    fn transform(&self, _models: &mut Vec<T>) -> Result<()> {
        Ok(())
    }

    /// Convert a whole table
    fn adapt_table(&self, table: &Table) -> Result<Vec<T>> {
        let mut models = Vec::with_capacity(table.num_rows());
        for batch in table.batches() {
            models.extend(self.from_record_batch(batch)?);
        }
        self.transform(&mut models)?;
        log::debug!(
            "Adapted {} of {} rows from {}",
            models.len(),
            table.num_rows(),
            self.table_name()
        );
        Ok(models)
    }
}
