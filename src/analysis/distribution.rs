//! Biomarker levels by cohort with pairwise rank tests

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::resolve_cohorts;
use crate::algorithm::statistics::{DescriptiveStats, mann_whitney_u, significance_label};
use crate::error::{BiomarkerError, Result};
use crate::models::{ClinicalVariable, Cohort, MergedDataset};

/// Box-plot statistics of one cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortDistribution {
    pub cohort: Cohort,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

/// Two-sided Mann-Whitney U test between two cohorts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortComparison {
    pub first: Cohort,
    pub second: Cohort,
    /// U statistic of the first cohort
    pub u_statistic: f64,
    pub p_value: f64,
    pub significance: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub variable: String,
    pub groups: Vec<CohortDistribution>,
    pub comparisons: Vec<CohortComparison>,
}

/// Describe each non-empty group and compare every pair of them
///
/// Groups keep the order they are given in.
#[must_use]
pub fn compare_groups(variable: &str, grouped: Vec<(Cohort, Vec<f64>)>) -> DistributionReport {
    let grouped: Vec<(Cohort, Vec<f64>)> = grouped
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let groups = grouped
        .iter()
        .filter_map(|(cohort, values)| {
            DescriptiveStats::from_values(values).map(|stats| CohortDistribution {
                cohort: *cohort,
                stats,
            })
        })
        .collect();

    let mut comparisons = Vec::new();
    for (i, (first, a)) in grouped.iter().enumerate() {
        for (second, b) in &grouped[i + 1..] {
            if let Some(test) = mann_whitney_u(a, b) {
                comparisons.push(CohortComparison {
                    first: *first,
                    second: *second,
                    u_statistic: test.u,
                    p_value: test.p_value,
                    significance: significance_label(test.p_value),
                });
            }
        }
    }

    DistributionReport {
        variable: variable.to_string(),
        groups,
        comparisons,
    }
}

/// Levels of `biomarker` in each of `cohorts` (the default cohorts when empty)
pub fn distribution(
    dataset: &MergedDataset,
    biomarker: &str,
    cohorts: &[Cohort],
) -> Result<DistributionReport> {
    let cohorts = resolve_cohorts(cohorts);
    let grouped: Vec<(Cohort, Vec<f64>)> = cohorts
        .iter()
        .map(|cohort| {
            let values = dataset
                .records_for(biomarker)
                .filter(|r| r.cohort() == Some(*cohort))
                .filter_map(|r| r.value())
                .collect();
            (*cohort, values)
        })
        .collect();

    if grouped.iter().all(|(_, values)| values.is_empty()) {
        return Err(
            BiomarkerError::InsufficientData(format!("no data available for {biomarker}")).into(),
        );
    }

    Ok(compare_groups(biomarker, grouped))
}

/// Levels of a clinical variable in each of `cohorts`
///
/// Motor scores and ages repeat on every row of a patient, so each patient
/// contributes the first value found per cohort.
pub fn clinical_distribution(
    dataset: &MergedDataset,
    variable: ClinicalVariable,
    cohorts: &[Cohort],
) -> Result<DistributionReport> {
    let cohorts = resolve_cohorts(cohorts);
    let grouped: Vec<(Cohort, Vec<f64>)> = cohorts
        .iter()
        .map(|cohort| {
            let mut seen = FxHashSet::default();
            let values = dataset
                .iter()
                .filter(|r| r.cohort() == Some(*cohort))
                .filter_map(|r| {
                    let value = r.clinical_value(variable)?;
                    seen.insert(r.patno()).then_some(value)
                })
                .collect();
            (*cohort, values)
        })
        .collect();

    if grouped.iter().all(|(_, values)| values.is_empty()) {
        return Err(
            BiomarkerError::InsufficientData(format!("no data available for {variable}")).into(),
        );
    }

    Ok(compare_groups(variable.name(), grouped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerRecord, MergedRecord, MotorScore, PatientId};

    fn row(patno: &str, cohort: Cohort, value: Option<f64>) -> MergedRecord {
        let mut biomarker = BiomarkerRecord::new(PatientId::parse(patno).unwrap(), "NEFL", value);
        biomarker.cohort = Some(cohort);
        MergedRecord::from_biomarker(biomarker)
    }

    fn dataset() -> MergedDataset {
        let mut rows = Vec::new();
        for (i, v) in [1.0, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
            rows.push(row(&format!("1{i}"), Cohort::HealthyControl, Some(*v)));
        }
        for (i, v) in [6.0, 7.0, 8.0, 9.0, 10.0].iter().enumerate() {
            rows.push(row(&format!("2{i}"), Cohort::Parkinsons, Some(*v)));
        }
        rows.push(row("30", Cohort::Parkinsons, None));
        MergedDataset::new(rows, Vec::new())
    }

    #[test]
    fn test_groups_and_comparison() {
        let report = distribution(&dataset(), "NEFL", &[]).unwrap();

        // Prodromal is requested by default but has no values
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].cohort, Cohort::HealthyControl);
        assert_eq!(report.groups[0].stats.median, 3.0);
        assert_eq!(report.groups[1].stats.n, 5);

        assert_eq!(report.comparisons.len(), 1);
        let comparison = &report.comparisons[0];
        assert_eq!(comparison.u_statistic, 0.0);
        assert_eq!(comparison.significance, "*");
    }

    #[test]
    fn test_unknown_biomarker_is_insufficient() {
        let err = distribution(&dataset(), "GFAP", &[Cohort::Parkinsons]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BiomarkerError>(),
            Some(BiomarkerError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_motor_score_counted_once_per_patient() {
        let mut rows = Vec::new();
        for (patno, cohort, total) in [
            ("1", Cohort::Parkinsons, Some(20.0)),
            ("1", Cohort::Parkinsons, Some(20.0)),
            ("2", Cohort::Parkinsons, Some(30.0)),
            ("3", Cohort::HealthyControl, Some(2.0)),
            ("4", Cohort::HealthyControl, None),
        ] {
            let mut record = row(patno, cohort, Some(1.0));
            record.motor.np3tot = total;
            rows.push(record);
        }
        let dataset = MergedDataset::new(rows, vec![MotorScore::Total]);

        let report =
            clinical_distribution(&dataset, ClinicalVariable::Motor(MotorScore::Total), &[]).unwrap();
        assert_eq!(report.variable, "NP3TOT");
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].cohort, Cohort::HealthyControl);
        assert_eq!(report.groups[0].stats.n, 1);
        assert_eq!(report.groups[1].stats.n, 2);
        assert_eq!(report.groups[1].stats.mean, 25.0);
        assert_eq!(report.comparisons.len(), 1);
    }

    #[test]
    fn test_clinical_variable_without_values_is_insufficient() {
        let dataset = dataset();
        assert!(
            clinical_distribution(&dataset, ClinicalVariable::Motor(MotorScore::Bradykinesia), &[])
                .is_err()
        );
    }
}
