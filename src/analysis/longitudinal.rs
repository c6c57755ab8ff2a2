//! Biomarker level against age at collection

use serde::Serialize;

use super::{MIN_CORRELATION_POINTS, resolve_cohorts};
use crate::algorithm::statistics::{Correlation, LinearFit, linear_regression, pearson};
use crate::error::{BiomarkerError, Result};
use crate::models::{Cohort, MergedDataset, PatientId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub patno: PatientId,
    pub cohort: Cohort,
    pub age: f64,
    pub value: f64,
}

/// Age association within one cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortTrend {
    pub cohort: Cohort,
    pub n: usize,
    /// Present when the cohort has enough points
    pub correlation: Option<Correlation>,
    pub fit: Option<LinearFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongitudinalReport {
    pub biomarker: String,
    pub points: Vec<TrendPoint>,
    pub trends: Vec<CohortTrend>,
}

/// Scatter of value against age per cohort, with per-cohort correlation
/// and least-squares line
pub fn longitudinal(
    dataset: &MergedDataset,
    biomarker: &str,
    cohorts: &[Cohort],
) -> Result<LongitudinalReport> {
    let cohorts = resolve_cohorts(cohorts);
    let points: Vec<TrendPoint> = dataset
        .records_for(biomarker)
        .filter_map(|r| {
            let cohort = r.cohort().filter(|c| cohorts.contains(c))?;
            Some(TrendPoint {
                patno: r.patno().clone(),
                cohort,
                age: r.age_at_biomarker?,
                value: r.value()?,
            })
        })
        .collect();

    if points.is_empty() {
        return Err(BiomarkerError::InsufficientData(format!(
            "no longitudinal data available for {biomarker}"
        ))
        .into());
    }

    let trends = cohorts
        .iter()
        .filter_map(|cohort| {
            let (ages, values): (Vec<f64>, Vec<f64>) = points
                .iter()
                .filter(|p| p.cohort == *cohort)
                .map(|p| (p.age, p.value))
                .unzip();
            if ages.is_empty() {
                return None;
            }
            let enough = ages.len() > MIN_CORRELATION_POINTS;
            Some(CohortTrend {
                cohort: *cohort,
                n: ages.len(),
                correlation: enough.then(|| pearson(&ages, &values)).flatten(),
                fit: enough.then(|| linear_regression(&ages, &values)).flatten(),
            })
        })
        .collect();

    Ok(LongitudinalReport {
        biomarker: biomarker.to_string(),
        points,
        trends,
    })
}
