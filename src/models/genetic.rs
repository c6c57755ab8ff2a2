//! Genetic variant profile model

use serde::{Deserialize, Serialize};

use crate::models::types::{PatientId, RiskGroup};

/// Consensus APOE genotype and pathogenic variant calls for a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticProfile {
    pub patno: PatientId,
    pub apoe: Option<String>,
    /// Number of pathogenic variants found across the screened genes
    pub pathvar_count: Option<f64>,
    pub lrrk2: Option<String>,
    pub gba: Option<String>,
    pub snca: Option<String>,
    pub risk_group: RiskGroup,
}

impl GeneticProfile {
    /// Create a profile, deriving the risk group from the variant count
    #[must_use]
    pub fn new(patno: PatientId, pathvar_count: Option<f64>) -> Self {
        Self {
            patno,
            apoe: None,
            pathvar_count,
            lrrk2: None,
            gba: None,
            snca: None,
            risk_group: RiskGroup::from_pathogenic_count(pathvar_count),
        }
    }
}
