//! Composite score views: distribution by cohort and association with
//! motor severity

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::correlation::{CorrelationPoint, CorrelationReport, pairs_report};
use super::distribution::{DistributionReport, compare_groups};
use crate::error::{BiomarkerError, Result};
use crate::models::{ClinicalVariable, Cohort, MergedDataset, MotorScore, PatientId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeReport {
    pub distribution: DistributionReport,
    /// Per-patient mean score against mean `NP3TOT`; absent without motor data
    pub motor_correlation: Option<CorrelationReport>,
}

/// Composite score by cohort and its correlation with `NP3TOT`
pub fn composite_report(dataset: &MergedDataset) -> Result<CompositeReport> {
    let score = ClinicalVariable::CompositeScore;
    let grouped: Vec<(Cohort, Vec<f64>)> = Cohort::ALL
        .iter()
        .map(|cohort| {
            let values = dataset
                .iter()
                .filter(|r| r.cohort() == Some(*cohort))
                .filter_map(|r| r.pd_pros)
                .collect();
            (*cohort, values)
        })
        .collect();

    if dataset.iter().all(|r| r.pd_pros.is_none()) {
        return Err(BiomarkerError::InsufficientData(
            "composite score could not be calculated; panel proteins are missing".to_string(),
        )
        .into());
    }

    let distribution = compare_groups(score.name(), grouped);
    let motor_correlation = if dataset.motor_scores().contains(&MotorScore::Total) {
        let points = motor_points(dataset);
        (!points.is_empty())
            .then(|| pairs_report(score.name(), MotorScore::Total.column(), points))
    } else {
        None
    };

    Ok(CompositeReport {
        distribution,
        motor_correlation,
    })
}

/// Per-patient mean score and mean `NP3TOT`, cohort from the patient's
/// first record that has one; patients missing any of the three are left out
fn motor_points(dataset: &MergedDataset) -> Vec<CorrelationPoint> {
    let mut order: Vec<&PatientId> = Vec::new();
    let mut patients: FxHashMap<&PatientId, PatientAcc> = FxHashMap::default();
    for record in dataset.iter() {
        let acc = patients.entry(record.patno()).or_insert_with(|| {
            order.push(record.patno());
            PatientAcc::default()
        });
        if acc.cohort.is_none() {
            acc.cohort = record.cohort();
        }
        if let Some(score) = record.pd_pros {
            acc.score_sum += score;
            acc.score_count += 1;
        }
        if let Some(total) = record.motor.np3tot {
            acc.motor_sum += total;
            acc.motor_count += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|patno| {
            let acc = patients.get(patno)?;
            if acc.score_count == 0 || acc.motor_count == 0 {
                return None;
            }
            Some(CorrelationPoint {
                patno: patno.clone(),
                cohort: acc.cohort?,
                x: acc.score_sum / acc.score_count as f64,
                y: acc.motor_sum / acc.motor_count as f64,
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct PatientAcc {
    cohort: Option<Cohort>,
    score_sum: f64,
    score_count: usize,
    motor_sum: f64,
    motor_count: usize,
}
