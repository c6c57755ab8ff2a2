//! Clinical visit models: age at visit, diagnosis and motor examination

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::demographics::Demographics;
use crate::models::types::PatientId;

/// Age of a participant at a study visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeAtVisit {
    pub patno: PatientId,
    pub event_id: Option<String>,
    pub age_at_visit: Option<f64>,
}

/// Clinical diagnosis recorded at a visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalDiagnosis {
    pub patno: PatientId,
    pub event_id: Option<String>,
    /// Primary diagnosis code (`PRIMDIAG`)
    pub primary_diagnosis: Option<String>,
    /// Whether the diagnosis changed at this visit (`NEWDIAG`)
    pub new_diagnosis: Option<String>,
}

/// MDS-UPDRS Part III items carried into the merged dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MotorScore {
    /// Part III total
    #[serde(rename = "NP3TOT")]
    Total,
    /// Global spontaneity of movement
    #[serde(rename = "NP3BRADY")]
    Bradykinesia,
    /// Rigidity, neck
    #[serde(rename = "NP3RIGN")]
    NeckRigidity,
    /// Postural tremor, right hand
    #[serde(rename = "NP3PTRMR")]
    PosturalTremorRight,
    /// Postural tremor, left hand
    #[serde(rename = "NP3PTRML")]
    PosturalTremorLeft,
}

impl MotorScore {
    pub const ALL: [MotorScore; 5] = [
        MotorScore::Total,
        MotorScore::Bradykinesia,
        MotorScore::NeckRigidity,
        MotorScore::PosturalTremorRight,
        MotorScore::PosturalTremorLeft,
    ];

    /// Source column holding this score
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Total => "NP3TOT",
            Self::Bradykinesia => "NP3BRADY",
            Self::NeckRigidity => "NP3RIGN",
            Self::PosturalTremorRight => "NP3PTRMR",
            Self::PosturalTremorLeft => "NP3PTRML",
        }
    }

    #[must_use]
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|score| score.column().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for MotorScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Values for the motor score items; absent items are `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorScores {
    pub np3tot: Option<f64>,
    pub np3brady: Option<f64>,
    pub np3rign: Option<f64>,
    pub np3ptrmr: Option<f64>,
    pub np3ptrml: Option<f64>,
}

impl MotorScores {
    #[must_use]
    pub const fn get(&self, score: MotorScore) -> Option<f64> {
        match score {
            MotorScore::Total => self.np3tot,
            MotorScore::Bradykinesia => self.np3brady,
            MotorScore::NeckRigidity => self.np3rign,
            MotorScore::PosturalTremorRight => self.np3ptrmr,
            MotorScore::PosturalTremorLeft => self.np3ptrml,
        }
    }

    pub fn set(&mut self, score: MotorScore, value: Option<f64>) {
        let slot = match score {
            MotorScore::Total => &mut self.np3tot,
            MotorScore::Bradykinesia => &mut self.np3brady,
            MotorScore::NeckRigidity => &mut self.np3rign,
            MotorScore::PosturalTremorRight => &mut self.np3ptrmr,
            MotorScore::PosturalTremorLeft => &mut self.np3ptrml,
        };
        *slot = value;
    }
}

/// One MDS-UPDRS Part III examination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorAssessment {
    pub patno: PatientId,
    pub event_id: Option<String>,
    pub scores: MotorScores,
}

/// The four clinical tables loaded together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClinicalData {
    pub demographics: Vec<Demographics>,
    pub age_at_visit: Vec<AgeAtVisit>,
    pub diagnosis: Vec<ClinicalDiagnosis>,
    pub motor: Vec<MotorAssessment>,
    /// Score columns present in the motor assessment source
    pub motor_columns: Vec<MotorScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_score_columns_round_trip() {
        for score in MotorScore::ALL {
            assert_eq!(MotorScore::from_column(score.column()), Some(score));
        }
        assert_eq!(MotorScore::from_column("np3tot"), Some(MotorScore::Total));
        assert_eq!(MotorScore::from_column("NP2TOT"), None);
    }

    #[test]
    fn test_scores_get_set() {
        let mut scores = MotorScores::default();
        scores.set(MotorScore::NeckRigidity, Some(2.0));
        assert_eq!(scores.get(MotorScore::NeckRigidity), Some(2.0));
        assert_eq!(scores.get(MotorScore::Total), None);
    }
}
