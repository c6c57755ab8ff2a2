//! Pairwise associations: scatter correlation and correlation heatmap
//!
//! Repeated measurements are reduced per patient before pairing, so every
//! patient contributes one point per cohort.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::MIN_CORRELATION_POINTS;
use crate::algorithm::statistics::{
    Correlation, LinearFit, linear_regression, pearson, pearson_coefficient,
};
use crate::error::{BiomarkerError, Result};
use crate::models::{ClinicalVariable, Cohort, MergedDataset, PatientId};

/// What the biomarker on the x axis is compared with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationTarget {
    Biomarker(String),
    Clinical(ClinicalVariable),
}

impl CorrelationTarget {
    /// Clinical variable names (`NP3TOT`, `AGE_AT_BIOMARKER`, `PD_PROS`)
    /// take precedence over test names
    #[must_use]
    pub fn parse(name: &str) -> Self {
        ClinicalVariable::from_name(name)
            .map_or_else(|| Self::Biomarker(name.to_string()), Self::Clinical)
    }
}

impl fmt::Display for CorrelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Biomarker(name) => f.write_str(name),
            Self::Clinical(variable) => write!(f, "{variable}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub patno: PatientId,
    pub cohort: Cohort,
    pub x: f64,
    pub y: f64,
}

/// Least-squares line through one cohort's points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortFit {
    pub cohort: Cohort,
    pub fit: LinearFit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub x: String,
    pub y: String,
    pub points: Vec<CorrelationPoint>,
    /// Over all points; present above the minimum point count
    pub correlation: Option<Correlation>,
    pub trend_lines: Vec<CohortFit>,
}

/// Running mean accumulator
#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Assemble a report from already reduced points
#[must_use]
pub fn pairs_report(x: &str, y: &str, points: Vec<CorrelationPoint>) -> CorrelationReport {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().map(|p| (p.x, p.y)).unzip();
    let correlation = if points.len() > MIN_CORRELATION_POINTS {
        pearson(&xs, &ys)
    } else {
        None
    };

    let mut by_cohort: BTreeMap<Cohort, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for point in &points {
        let (cx, cy) = by_cohort.entry(point.cohort).or_default();
        cx.push(point.x);
        cy.push(point.y);
    }
    let trend_lines = by_cohort
        .into_iter()
        .filter_map(|(cohort, (cx, cy))| {
            linear_regression(&cx, &cy).map(|fit| CohortFit { cohort, fit })
        })
        .collect();

    CorrelationReport {
        x: x.to_string(),
        y: y.to_string(),
        points,
        correlation,
        trend_lines,
    }
}

/// Correlate a biomarker with another biomarker or with a clinical variable
///
/// Against a biomarker, each side is averaged per patient and the cohort
/// comes from the x side. Against a clinical variable, both sides are
/// averaged per (patient, cohort).
pub fn correlation(
    dataset: &MergedDataset,
    biomarker: &str,
    target: &CorrelationTarget,
) -> Result<CorrelationReport> {
    let points: Vec<CorrelationPoint> = match target {
        CorrelationTarget::Clinical(variable) => {
            let mut groups: BTreeMap<(&PatientId, Cohort), (MeanAcc, MeanAcc)> = BTreeMap::new();
            for record in dataset.records_for(biomarker) {
                let (Some(cohort), Some(x), Some(y)) = (
                    record.cohort(),
                    record.value(),
                    record.clinical_value(*variable),
                ) else {
                    continue;
                };
                let (ax, ay) = groups.entry((record.patno(), cohort)).or_default();
                ax.push(x);
                ay.push(y);
            }
            groups
                .into_iter()
                .filter_map(|((patno, cohort), (ax, ay))| {
                    Some(CorrelationPoint {
                        patno: patno.clone(),
                        cohort,
                        x: ax.mean()?,
                        y: ay.mean()?,
                    })
                })
                .collect()
        }
        CorrelationTarget::Biomarker(other) => {
            let mut xs: BTreeMap<(&PatientId, Cohort), MeanAcc> = BTreeMap::new();
            for record in dataset.records_for(biomarker) {
                if let (Some(cohort), Some(value)) = (record.cohort(), record.value()) {
                    xs.entry((record.patno(), cohort)).or_default().push(value);
                }
            }
            let mut ys: BTreeMap<&PatientId, MeanAcc> = BTreeMap::new();
            for record in dataset.records_for(other) {
                if let Some(value) = record.value() {
                    ys.entry(record.patno()).or_default().push(value);
                }
            }
            xs.into_iter()
                .filter_map(|((patno, cohort), ax)| {
                    Some(CorrelationPoint {
                        patno: patno.clone(),
                        cohort,
                        x: ax.mean()?,
                        y: ys.get(patno)?.mean()?,
                    })
                })
                .collect()
        }
    };

    if points.is_empty() {
        return Err(BiomarkerError::InsufficientData(format!(
            "no paired data available for {biomarker} vs {target}"
        ))
        .into());
    }

    Ok(pairs_report(biomarker, &target.to_string(), points))
}

/// Pairwise-complete correlation matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapReport {
    pub variables: Vec<String>,
    /// `None` where a pair has too few shared patients or no variance
    pub matrix: Vec<Vec<Option<f64>>>,
    /// Patients shared by each pair
    pub counts: Vec<Vec<usize>>,
}

/// Correlation matrix over biomarkers and clinical variables
///
/// Biomarkers are averaged per patient; clinical variables take the first
/// non-missing value per patient. Variables without data are left out and
/// at least two must remain.
pub fn heatmap(
    dataset: &MergedDataset,
    biomarkers: &[String],
    clinical: &[ClinicalVariable],
) -> Result<HeatmapReport> {
    let mut columns: Vec<(String, BTreeMap<&PatientId, f64>)> = Vec::new();

    for biomarker in biomarkers {
        let mut acc: BTreeMap<&PatientId, MeanAcc> = BTreeMap::new();
        for record in dataset.records_for(biomarker) {
            if let Some(value) = record.value() {
                acc.entry(record.patno()).or_default().push(value);
            }
        }
        let column: BTreeMap<&PatientId, f64> = acc
            .into_iter()
            .filter_map(|(patno, a)| Some((patno, a.mean()?)))
            .collect();
        if !column.is_empty() {
            columns.push((biomarker.clone(), column));
        }
    }

    for variable in clinical {
        if let ClinicalVariable::Motor(score) = variable {
            if !dataset.motor_scores().contains(score) {
                continue;
            }
        }
        let mut column: BTreeMap<&PatientId, f64> = BTreeMap::new();
        for record in dataset.iter() {
            if let Some(value) = record.clinical_value(*variable) {
                column.entry(record.patno()).or_insert(value);
            }
        }
        if !column.is_empty() {
            columns.push((variable.name().to_string(), column));
        }
    }

    if columns.len() < 2 {
        return Err(BiomarkerError::InsufficientData(
            "a correlation heatmap needs at least two variables with data".to_string(),
        )
        .into());
    }

    let size = columns.len();
    let mut matrix = vec![vec![None; size]; size];
    let mut counts = vec![vec![0; size]; size];
    for i in 0..size {
        for j in i..size {
            let (xs, ys): (Vec<f64>, Vec<f64>) = columns[i]
                .1
                .iter()
                .filter_map(|(patno, x)| columns[j].1.get(patno).map(|y| (*x, *y)))
                .unzip();
            let r = pearson_coefficient(&xs, &ys);
            matrix[i][j] = r;
            matrix[j][i] = r;
            counts[i][j] = xs.len();
            counts[j][i] = xs.len();
        }
    }

    Ok(HeatmapReport {
        variables: columns.into_iter().map(|(name, _)| name).collect(),
        matrix,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerRecord, MergedRecord, MotorScore};

    fn row(patno: usize, test: &str, cohort: Option<Cohort>, value: f64, np3tot: Option<f64>) -> MergedRecord {
        let mut biomarker =
            BiomarkerRecord::new(PatientId::parse(&patno.to_string()).unwrap(), test, Some(value));
        biomarker.cohort = cohort;
        let mut record = MergedRecord::from_biomarker(biomarker);
        record.motor.np3tot = np3tot;
        record
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!(
            CorrelationTarget::parse("NP3TOT"),
            CorrelationTarget::Clinical(ClinicalVariable::Motor(MotorScore::Total))
        );
        assert_eq!(
            CorrelationTarget::parse("tTau"),
            CorrelationTarget::Biomarker("tTau".to_string())
        );
    }

    #[test]
    fn test_biomarker_pairs_are_patient_means() {
        let pd = Some(Cohort::Parkinsons);
        let dataset = MergedDataset::new(
            vec![
                row(1, "pTau", pd, 1.0, None),
                row(1, "pTau", pd, 3.0, None),
                row(1, "tTau", None, 10.0, None),
                row(1, "tTau", None, 20.0, None),
                row(2, "pTau", pd, 5.0, None),
                row(3, "tTau", pd, 7.0, None),
            ],
            Vec::new(),
        );
        let report =
            correlation(&dataset, "pTau", &CorrelationTarget::Biomarker("tTau".to_string())).unwrap();

        assert_eq!(report.points.len(), 1);
        assert_eq!(report.points[0].x, 2.0);
        assert_eq!(report.points[0].y, 15.0);
        assert!(report.correlation.is_none());
    }

    #[test]
    fn test_clinical_correlation_over_six_patients() {
        let rows: Vec<MergedRecord> = (1..=6)
            .map(|i| row(i, "NEFL", Some(Cohort::Parkinsons), i as f64, Some(2.0 * i as f64)))
            .collect();
        let dataset = MergedDataset::new(rows, vec![MotorScore::Total]);
        let report = correlation(
            &dataset,
            "NEFL",
            &CorrelationTarget::Clinical(ClinicalVariable::Motor(MotorScore::Total)),
        )
        .unwrap();

        assert_eq!(report.y, "NP3TOT");
        assert_eq!(report.points.len(), 6);
        assert!((report.correlation.unwrap().r - 1.0).abs() < 1e-12);
        assert_eq!(report.trend_lines.len(), 1);
        assert!((report.trend_lines[0].fit.slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_heatmap_pairwise_complete() {
        let pd = Some(Cohort::Parkinsons);
        let dataset = MergedDataset::new(
            vec![
                row(1, "A", pd, 1.0, Some(3.0)),
                row(2, "A", pd, 2.0, Some(2.0)),
                row(3, "A", pd, 3.0, Some(1.0)),
                row(1, "B", pd, 1.0, Some(3.0)),
                row(2, "B", pd, 1.0, Some(2.0)),
            ],
            vec![MotorScore::Total],
        );
        let report = heatmap(
            &dataset,
            &["A".to_string(), "B".to_string(), "C".to_string()],
            &[ClinicalVariable::Motor(MotorScore::Total)],
        )
        .unwrap();

        assert_eq!(report.variables, vec!["A", "B", "NP3TOT"]);
        assert_eq!(report.matrix[0][0], Some(1.0));
        // B is constant
        assert_eq!(report.matrix[0][1], None);
        assert_eq!(report.counts[0][1], 2);
        assert!((report.matrix[0][2].unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(report.matrix[2][0], report.matrix[0][2]);
    }

    #[test]
    fn test_heatmap_needs_two_variables() {
        let dataset = MergedDataset::new(
            vec![row(1, "A", None, 1.0, None)],
            vec![MotorScore::Total],
        );
        let err = heatmap(&dataset, &["A".to_string()], &[ClinicalVariable::Motor(MotorScore::Total)])
            .unwrap_err();
        assert!(err.to_string().contains("at least two"));
    }
}
