//! Participant demographics model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::types::{PatientId, Sex};

/// Static demographic attributes of a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub patno: PatientId,
    pub sex: Option<Sex>,
    /// Birth month; the source only records `MM/YYYY` so the day is always 1
    pub birth_date: Option<NaiveDate>,
    pub handed: Option<i64>,
    pub hisplat: Option<i64>,
    pub rawhite: Option<i64>,
    pub rablack: Option<i64>,
    pub raasian: Option<i64>,
}

impl Demographics {
    #[must_use]
    pub fn new(patno: PatientId) -> Self {
        Self {
            patno,
            sex: None,
            birth_date: None,
            handed: None,
            hisplat: None,
            rawhite: None,
            rablack: None,
            raasian: None,
        }
    }

    /// Age in years at `date`, using 365.25-day years
    #[must_use]
    pub fn age_at(&self, date: NaiveDate) -> Option<f64> {
        self.birth_date
            .map(|birth| (date - birth).num_days() as f64 / 365.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_at_uses_julian_years() {
        let mut demo = Demographics::new(PatientId::parse("1").unwrap());
        demo.birth_date = NaiveDate::from_ymd_opt(1950, 1, 1);

        let age = demo.age_at(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).unwrap();
        let expected = 25567.0 / 365.25;
        assert!((age - expected).abs() < 1e-9);
    }

    #[test]
    fn test_age_without_birth_date() {
        let demo = Demographics::new(PatientId::parse("1").unwrap());
        assert!(demo.age_at(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).is_none());
    }
}
