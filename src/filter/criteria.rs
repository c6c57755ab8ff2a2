//! Participant filters for the merged dataset
//!
//! Each criterion is optional. An unset criterion keeps every row; a set
//! criterion drops rows whose field is missing.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::generic::{AndFilter, RecordFilter};
use crate::models::{Cohort, MergedDataset, MergedRecord, RiskGroup, Sex};

/// Keep rows in any of the given cohorts
#[derive(Debug, Clone)]
pub struct CohortFilter {
    cohorts: Vec<Cohort>,
}

impl CohortFilter {
    #[must_use]
    pub fn new(cohorts: Vec<Cohort>) -> Self {
        Self { cohorts }
    }
}

impl RecordFilter<MergedRecord> for CohortFilter {
    fn matches(&self, record: &MergedRecord) -> bool {
        record.cohort().is_some_and(|c| self.cohorts.contains(&c))
    }

    fn required_fields(&self) -> HashSet<String> {
        HashSet::from(["COHORT".to_string()])
    }
}

/// Keep rows whose age at collection is within `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct AgeRangeFilter {
    min: f64,
    max: f64,
}

impl AgeRangeFilter {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl RecordFilter<MergedRecord> for AgeRangeFilter {
    fn matches(&self, record: &MergedRecord) -> bool {
        record
            .age_at_biomarker
            .is_some_and(|age| age >= self.min && age <= self.max)
    }

    fn required_fields(&self) -> HashSet<String> {
        HashSet::from(["AGE_AT_BIOMARKER".to_string()])
    }
}

/// Keep rows of the given sexes
#[derive(Debug, Clone)]
pub struct SexFilter {
    sexes: Vec<Sex>,
}

impl SexFilter {
    #[must_use]
    pub fn new(sexes: Vec<Sex>) -> Self {
        Self { sexes }
    }
}

impl RecordFilter<MergedRecord> for SexFilter {
    fn matches(&self, record: &MergedRecord) -> bool {
        record.sex.is_some_and(|s| self.sexes.contains(&s))
    }

    fn required_fields(&self) -> HashSet<String> {
        HashSet::from(["SEX".to_string()])
    }
}

/// Keep rows in the given genetic risk groups
#[derive(Debug, Clone)]
pub struct RiskGroupFilter {
    groups: Vec<RiskGroup>,
}

impl RiskGroupFilter {
    #[must_use]
    pub fn new(groups: Vec<RiskGroup>) -> Self {
        Self { groups }
    }
}

impl RecordFilter<MergedRecord> for RiskGroupFilter {
    fn matches(&self, record: &MergedRecord) -> bool {
        record.risk_group.is_some_and(|g| self.groups.contains(&g))
    }

    fn required_fields(&self) -> HashSet<String> {
        HashSet::from(["RISK_GROUP".to_string()])
    }
}

/// User-selected filter settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub cohorts: Option<Vec<Cohort>>,
    /// Inclusive age bounds in years
    pub age_range: Option<(f64, f64)>,
    pub sexes: Option<Vec<Sex>>,
    pub risk_groups: Option<Vec<RiskGroup>>,
}

impl FilterCriteria {
    /// Whether no criterion is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_none()
            && self.age_range.is_none()
            && self.sexes.is_none()
            && self.risk_groups.is_none()
    }

    /// Fill every unset criterion from `defaults`
    #[must_use]
    pub fn or(self, defaults: &Self) -> Self {
        Self {
            cohorts: self.cohorts.or_else(|| defaults.cohorts.clone()),
            age_range: self.age_range.or(defaults.age_range),
            sexes: self.sexes.or_else(|| defaults.sexes.clone()),
            risk_groups: self.risk_groups.or_else(|| defaults.risk_groups.clone()),
        }
    }

    /// Conjunction of the set criteria
    #[must_use]
    pub fn build(&self) -> AndFilter<MergedRecord> {
        let mut filter = AndFilter::default();
        if let Some(cohorts) = &self.cohorts {
            filter = filter.and(CohortFilter::new(cohorts.clone()));
        }
        if let Some((min, max)) = self.age_range {
            filter = filter.and(AgeRangeFilter::new(min, max));
        }
        if let Some(sexes) = &self.sexes {
            filter = filter.and(SexFilter::new(sexes.clone()));
        }
        if let Some(groups) = &self.risk_groups {
            filter = filter.and(RiskGroupFilter::new(groups.clone()));
        }
        filter
    }

    /// Rows of `dataset` passing every set criterion
    #[must_use]
    pub fn apply(&self, dataset: &MergedDataset) -> MergedDataset {
        let filter = self.build();
        let filtered = dataset.retain_where(|r| filter.matches(r));
        log::debug!(
            "Filters on {:?} kept {} of {} records",
            filter.required_fields(),
            filtered.len(),
            dataset.len()
        );
        filtered
    }
}

fn join_labels<T, F>(items: &[T], label: F) -> String
where
    F: Fn(&T) -> &'static str,
{
    items.iter().map(label).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filters:")?;
        match &self.cohorts {
            Some(cohorts) => writeln!(f, "  Cohorts: {}", join_labels(cohorts, |c| c.label()))?,
            None => writeln!(f, "  Cohorts: all")?,
        }
        match self.age_range {
            Some((min, max)) => writeln!(f, "  Age: {min} - {max}")?,
            None => writeln!(f, "  Age: all")?,
        }
        match &self.sexes {
            Some(sexes) => writeln!(f, "  Sex: {}", join_labels(sexes, |s| s.label()))?,
            None => writeln!(f, "  Sex: all")?,
        }
        match &self.risk_groups {
            Some(groups) => writeln!(f, "  Risk Groups: {}", join_labels(groups, |g| g.label()))?,
            None => writeln!(f, "  Risk Groups: all")?,
        }
        Ok(())
    }
}
