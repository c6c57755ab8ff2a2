//! Genetic variant table to `GeneticProfile` adapter

use arrow::record_batch::RecordBatch;

use super::{PATNO, SourceAdapter};
use crate::error::Result;
use crate::models::genetic::GeneticProfile;
use crate::models::types::PatientId;
use crate::utils::arrow::{parse_f64, string_column, value_at};

/// Adapter for the consensus genotype / pathogenic variant table
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneticAdapter;

impl SourceAdapter<GeneticProfile> for GeneticAdapter {
    fn table_name(&self) -> &str {
        "genetic"
    }

    fn from_record_batch(&self, batch: &RecordBatch) -> Result<Vec<GeneticProfile>> {
        let table = self.table_name();
        let patno = string_column(batch, table, PATNO, true)?;
        let apoe = string_column(batch, table, "APOE", false)?;
        let pathvar = string_column(batch, table, "PATHVAR_COUNT", false)?;
        let lrrk2 = string_column(batch, table, "LRRK2", false)?;
        let gba = string_column(batch, table, "GBA", false)?;
        let snca = string_column(batch, table, "SNCA", false)?;

        let mut profiles = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let Some(id) = value_at(patno, row).and_then(PatientId::parse) else {
                continue;
            };

            let mut profile = GeneticProfile::new(id, value_at(pathvar, row).and_then(parse_f64));
            profile.apoe = value_at(apoe, row).map(str::to_string);
            profile.lrrk2 = value_at(lrrk2, row).map(str::to_string);
            profile.gba = value_at(gba, row).map(str::to_string);
            profile.snca = value_at(snca, row).map(str::to_string);
            profiles.push(profile);
        }

        Ok(profiles)
    }
}
