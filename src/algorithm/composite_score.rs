//! PD proteomic score (PD-ProS)
//!
//! A weighted sum of z-scored protein levels. Values are pivoted to one
//! cell per (patient, run date, protein), each protein is standardized over
//! its cells, and each (patient, run date) group is scored from the proteins
//! it actually has.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::algorithm::statistics::{mean, sample_std};
use crate::models::{MergedDataset, MergedRecord, PatientId};
use crate::utils::logging::log_warning;

/// Panel proteins and their coefficients
pub const PD_PROS_PANEL: [(&str, f64); 14] = [
    ("NEFL", 0.13),
    ("GFAP", 0.11),
    ("UCHL1", 0.10),
    ("GP130", -0.09),
    ("MMP2", -0.08),
    ("TIMP1", -0.08),
    ("A2M", -0.07),
    ("IL6R", 0.07),
    ("ICAM1", 0.07),
    ("VCAM1", 0.06),
    ("DCN", -0.06),
    ("VEGFA", 0.05),
    ("FGF21", 0.05),
    ("ENRAGE", 0.05),
];

/// Key of a scored group
pub type ScoreKey = (PatientId, NaiveDate);

/// Mean and spread used to standardize one protein
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProteinScale {
    pub mean: f64,
    /// `None` with fewer than two cells
    pub std: Option<f64>,
}

impl ProteinScale {
    /// z-score of a value; zero when the spread is zero or undefined
    #[must_use]
    pub fn z(&self, value: f64) -> f64 {
        match self.std {
            Some(std) if std > 0.0 => (value - self.mean) / std,
            _ => 0.0,
        }
    }
}

/// Computes a weighted z-score composite over a protein panel
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    panel: Vec<(String, f64)>,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new(
            PD_PROS_PANEL
                .iter()
                .map(|(protein, coefficient)| ((*protein).to_string(), *coefficient))
                .collect(),
        )
    }
}

impl CompositeScorer {
    #[must_use]
    pub fn new(panel: Vec<(String, f64)>) -> Self {
        Self { panel }
    }

    #[must_use]
    pub fn panel(&self) -> &[(String, f64)] {
        &self.panel
    }

    /// Mean value per (patient, run date) for every panel protein
    ///
    /// The outer index follows the panel order. Records without a numeric
    /// value or a run date do not contribute.
    #[must_use]
    pub fn pivot(&self, records: &[MergedRecord]) -> FxHashMap<ScoreKey, Vec<Option<f64>>> {
        let index: FxHashMap<&str, usize> = self
            .panel
            .iter()
            .enumerate()
            .map(|(i, (protein, _))| (protein.as_str(), i))
            .collect();

        let mut sums: FxHashMap<ScoreKey, Vec<(f64, usize)>> = FxHashMap::default();
        for record in records {
            let Some(&slot) = index.get(record.test_name()) else {
                continue;
            };
            let (Some(value), Some(run_date)) = (record.value(), record.run_date()) else {
                continue;
            };
            let cells = sums
                .entry((record.patno().clone(), run_date))
                .or_insert_with(|| vec![(0.0, 0); self.panel.len()]);
            cells[slot].0 += value;
            cells[slot].1 += 1;
        }

        sums.into_iter()
            .map(|(key, cells)| {
                let means = cells
                    .into_iter()
                    .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                    .collect();
                (key, means)
            })
            .collect()
    }

    /// Per-protein scale over the pivot cells, `None` for absent proteins
    #[must_use]
    pub fn scales(&self, pivot: &FxHashMap<ScoreKey, Vec<Option<f64>>>) -> Vec<Option<ProteinScale>> {
        (0..self.panel.len())
            .map(|slot| {
                let values: Vec<f64> = pivot.values().filter_map(|cells| cells[slot]).collect();
                mean(&values).map(|m| ProteinScale {
                    mean: m,
                    std: sample_std(&values),
                })
            })
            .collect()
    }

    /// Score every (patient, run date) group that has at least one panel protein
    #[must_use]
    pub fn compute(&self, records: &[MergedRecord]) -> FxHashMap<ScoreKey, f64> {
        let pivot = self.pivot(records);
        let scales = self.scales(&pivot);

        let missing: Vec<&str> = self
            .panel
            .iter()
            .zip(&scales)
            .filter(|(_, scale)| scale.is_none())
            .map(|((protein, _), _)| protein.as_str())
            .collect();
        if !missing.is_empty() {
            log_warning(
                &format!("Composite score proteins missing from data: {}", missing.join(", ")),
                None,
            );
        }

        pivot
            .into_iter()
            .filter_map(|(key, cells)| {
                let mut present = 0;
                let mut score = 0.0;
                for (((_, coefficient), cell), scale) in self.panel.iter().zip(&cells).zip(&scales) {
                    if let (Some(value), Some(scale)) = (cell, scale) {
                        score += coefficient * scale.z(*value);
                        present += 1;
                    }
                }
                (present > 0).then_some((key, score))
            })
            .collect()
    }

    /// Compute scores and store them on the records of each scored group
    ///
    /// Returns the number of scored groups.
    pub fn attach(&self, dataset: &mut MergedDataset) -> usize {
        let scores = self.compute(dataset.records());
        for record in dataset.records_mut() {
            record.pd_pros = record
                .run_date()
                .and_then(|date| scores.get(&(record.patno().clone(), date)).copied());
        }
        log::info!("Computed composite score for {} patient visits", scores.len());
        scores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BiomarkerRecord;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn row(patno: &str, protein: &str, value: Option<f64>, run: Option<NaiveDate>) -> MergedRecord {
        let mut biomarker = BiomarkerRecord::new(PatientId::parse(patno).unwrap(), protein, value);
        biomarker.run_date = run;
        MergedRecord::from_biomarker(biomarker)
    }

    fn key(patno: &str, day: u32) -> ScoreKey {
        (PatientId::parse(patno).unwrap(), date(day))
    }

    #[test]
    fn test_single_protein_score() {
        let scorer = CompositeScorer::default();
        let records = vec![
            row("1", "NEFL", Some(10.0), Some(date(1))),
            row("2", "NEFL", Some(20.0), Some(date(1))),
            row("3", "NEFL", Some(30.0), Some(date(1))),
        ];
        let scores = scorer.compute(&records);

        // mean 20, sample std 10
        assert!((scores[&key("1", 1)] - -0.13).abs() < 1e-12);
        assert!(scores[&key("2", 1)].abs() < 1e-12);
        assert!((scores[&key("3", 1)] - 0.13).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_contributes_zero() {
        let scorer = CompositeScorer::default();
        let records = vec![
            row("1", "GFAP", Some(5.0), Some(date(1))),
            row("2", "GFAP", Some(5.0), Some(date(1))),
            row("3", "UCHL1", Some(7.0), Some(date(2))),
        ];
        let scores = scorer.compute(&records);

        assert_eq!(scores[&key("1", 1)], 0.0);
        assert_eq!(scores[&key("2", 1)], 0.0);
        // a single cell has no sample spread
        assert_eq!(scores[&key("3", 2)], 0.0);
        assert!(scores.values().all(|s| s.is_finite()));
    }

    #[test]
    fn test_group_without_panel_proteins_has_no_score() {
        let scorer = CompositeScorer::default();
        let mut dataset = MergedDataset::new(
            vec![
                row("1", "NEFL", Some(1.0), Some(date(1))),
                row("1", "CSF Alpha-synuclein", Some(3.0), Some(date(1))),
                row("2", "CSF Alpha-synuclein", Some(3.0), Some(date(1))),
                row("3", "NEFL", None, Some(date(1))),
                row("4", "NEFL", Some(2.0), None),
            ],
            Vec::new(),
        );
        let groups = scorer.attach(&mut dataset);

        assert_eq!(groups, 1);
        let records = dataset.records();
        assert_eq!(records[0].pd_pros, Some(0.0));
        // the score belongs to the whole (patient, run date) group
        assert_eq!(records[1].pd_pros, Some(0.0));
        assert_eq!(records[2].pd_pros, None);
        assert_eq!(records[3].pd_pros, None);
        assert_eq!(records[4].pd_pros, None);
    }

    #[test]
    fn test_duplicates_are_averaged_in_pivot() {
        let scorer = CompositeScorer::default();
        let records = vec![
            row("1", "NEFL", Some(10.0), Some(date(1))),
            row("1", "NEFL", Some(20.0), Some(date(1))),
            row("2", "NEFL", Some(25.0), Some(date(1))),
        ];
        let pivot = scorer.pivot(&records);

        assert_eq!(pivot.len(), 2);
        assert_eq!(pivot[&key("1", 1)][0], Some(15.0));
        assert_eq!(pivot[&key("2", 1)][0], Some(25.0));
        assert_eq!(pivot[&key("1", 1)][1], None);

        let scales = scorer.scales(&pivot);
        let nefl = scales[0].unwrap();
        assert_eq!(nefl.mean, 20.0);
        assert!(scales[1].is_none());
    }

    #[test]
    fn test_missing_proteins_excluded_from_sum() {
        let scorer = CompositeScorer::new(vec![("A".to_string(), 1.0), ("B".to_string(), -1.0)]);
        let records = vec![
            row("1", "A", Some(0.0), Some(date(1))),
            row("2", "A", Some(2.0), Some(date(1))),
            row("1", "B", Some(0.0), Some(date(1))),
            row("3", "B", Some(4.0), Some(date(1))),
        ];
        let scores = scorer.compute(&records);

        // A: mean 1, std sqrt(2); B: mean 2, std sqrt(8)
        let za = -1.0 / 2f64.sqrt();
        let zb = -2.0 / 8f64.sqrt();
        assert!((scores[&key("1", 1)] - (za - zb)).abs() < 1e-12);
        assert!((scores[&key("2", 1)] - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!((scores[&key("3", 1)] - -(2.0 / 8f64.sqrt())).abs() < 1e-12);
    }
}
