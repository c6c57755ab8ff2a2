//! Shared value types for the study entities

use std::fmt;

use serde::{Deserialize, Serialize};

/// Patient identifier (`PATNO`) in normalized textual form
///
/// Sources disagree on how the identifier is typed: CSV gives `3001`, a
/// float-typed column gives `3001.0`, Parquet may give an integer. All of
/// them normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Normalize a raw identifier, returning `None` for blank input
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(number) = trimmed.parse::<f64>() {
            if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
                return Some(Self(format!("{}", number as i64)));
            }
        }

        Some(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diagnostic cohort of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cohort {
    /// Healthy control
    #[serde(rename = "HC")]
    HealthyControl,
    /// Parkinson's disease
    #[serde(rename = "PD")]
    Parkinsons,
    /// Prodromal Parkinson's disease
    #[serde(rename = "Prodromal PD")]
    Prodromal,
    /// Scans without evidence of dopaminergic deficit
    #[serde(rename = "SWEDD")]
    Swedd,
}

impl Cohort {
    pub const ALL: [Cohort; 4] = [
        Cohort::HealthyControl,
        Cohort::Parkinsons,
        Cohort::Prodromal,
        Cohort::Swedd,
    ];

    /// Map the raw `COHORT` label of the biospecimen table
    ///
    /// Only the four study labels are recognized; anything else has no cohort.
    #[must_use]
    pub fn from_raw_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Control" => Some(Self::HealthyControl),
            "PD" => Some(Self::Parkinsons),
            "Prodromal" => Some(Self::Prodromal),
            "SWEDD" => Some(Self::Swedd),
            _ => None,
        }
    }

    /// Parse the short label used in reports and on the command line
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        match lower.as_str() {
            "hc" | "control" => Some(Self::HealthyControl),
            "pd" => Some(Self::Parkinsons),
            "prodromal pd" | "prodromal" => Some(Self::Prodromal),
            "swedd" => Some(Self::Swedd),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HealthyControl => "HC",
            Self::Parkinsons => "PD",
            Self::Prodromal => "Prodromal PD",
            Self::Swedd => "SWEDD",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Biological sex as coded in the demographics table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// `0` is female, `1` is male; other codes are unknown
    #[must_use]
    pub fn from_code(code: f64) -> Option<Self> {
        if code == 0.0 {
            Some(Self::Female)
        } else if code == 1.0 {
            Some(Self::Male)
        } else {
            None
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "female" | "f" | "0" => Some(Self::Female),
            "male" | "m" | "1" => Some(Self::Male),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Genetic risk classification derived from pathogenic variant counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskGroup {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Standard Risk")]
    Standard,
}

impl RiskGroup {
    /// Any pathogenic variant puts the participant in the high-risk group.
    /// A missing count is standard risk.
    #[must_use]
    pub fn from_pathogenic_count(count: Option<f64>) -> Self {
        match count {
            Some(n) if n > 0.0 => Self::High,
            _ => Self::Standard,
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high risk" | "high" => Some(Self::High),
            "standard risk" | "standard" => Some(Self::Standard),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Standard => "Standard Risk",
        }
    }
}

impl fmt::Display for RiskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_normalization() {
        assert_eq!(PatientId::parse("3001").unwrap().as_str(), "3001");
        assert_eq!(PatientId::parse(" 3001.0 ").unwrap().as_str(), "3001");
        assert_eq!(PatientId::parse("BL-17").unwrap().as_str(), "BL-17");
        assert!(PatientId::parse("   ").is_none());
    }

    #[test]
    fn test_cohort_mapping() {
        assert_eq!(Cohort::from_raw_label("Control"), Some(Cohort::HealthyControl));
        assert_eq!(Cohort::from_raw_label("Prodromal"), Some(Cohort::Prodromal));
        assert_eq!(Cohort::from_raw_label("Genetic Cohort"), None);
        assert_eq!(Cohort::from_label("prodromal pd"), Some(Cohort::Prodromal));
        assert_eq!(Cohort::Prodromal.to_string(), "Prodromal PD");
    }

    #[test]
    fn test_risk_group_from_count() {
        assert_eq!(RiskGroup::from_pathogenic_count(Some(2.0)), RiskGroup::High);
        assert_eq!(RiskGroup::from_pathogenic_count(Some(0.0)), RiskGroup::Standard);
        assert_eq!(RiskGroup::from_pathogenic_count(None), RiskGroup::Standard);
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::from_code(0.0), Some(Sex::Female));
        assert_eq!(Sex::from_code(1.0), Some(Sex::Male));
        assert_eq!(Sex::from_code(2.0), None);
    }
}
