//! Headline counts for a merged dataset

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::algorithm::statistics::round_to;
use crate::models::{Cohort, MergedDataset, MergedRecord};

const TOP_BIOMARKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortCount {
    pub cohort: Cohort,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiomarkerCount {
    pub test_name: String,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub unique_patients: usize,
    pub unique_biomarkers: usize,
    /// Rows per cohort, most frequent first
    pub cohort_counts: Vec<CohortCount>,
    /// The ten most measured biomarkers
    pub top_biomarkers: Vec<BiomarkerCount>,
    /// Rows without a numeric value
    pub missing_values: usize,
    pub missing_percent: f64,
}

#[must_use]
pub fn summarize(dataset: &MergedDataset) -> DatasetSummary {
    let total_records = dataset.len();

    let cohort_counts = dataset
        .iter()
        .filter_map(MergedRecord::cohort)
        .counts()
        .into_iter()
        .map(|(cohort, records)| CohortCount { cohort, records })
        .sorted_by(|a, b| b.records.cmp(&a.records).then(a.cohort.cmp(&b.cohort)))
        .collect();

    let mut per_test: FxHashMap<&str, usize> = FxHashMap::default();
    for record in dataset.iter() {
        *per_test.entry(record.test_name()).or_default() += 1;
    }
    let unique_biomarkers = per_test.len();
    let top_biomarkers = per_test
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
        .take(TOP_BIOMARKERS)
        .map(|(name, records)| BiomarkerCount {
            test_name: name.to_string(),
            records,
        })
        .collect();

    let missing_values = dataset.iter().filter(|r| r.value().is_none()).count();
    let missing_percent = if total_records == 0 {
        0.0
    } else {
        round_to(missing_values as f64 / total_records as f64 * 100.0, 2)
    };

    DatasetSummary {
        total_records,
        unique_patients: dataset.patient_count(),
        unique_biomarkers,
        cohort_counts,
        top_biomarkers,
        missing_values,
        missing_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerRecord, PatientId};

    fn row(patno: &str, test: &str, cohort: Option<Cohort>, value: Option<f64>) -> MergedRecord {
        let mut biomarker = BiomarkerRecord::new(PatientId::parse(patno).unwrap(), test, value);
        biomarker.cohort = cohort;
        MergedRecord::from_biomarker(biomarker)
    }

    #[test]
    fn test_summary_counts() {
        let dataset = MergedDataset::new(
            vec![
                row("1", "NEFL", Some(Cohort::Parkinsons), Some(1.0)),
                row("1", "GFAP", Some(Cohort::Parkinsons), None),
                row("2", "NEFL", Some(Cohort::HealthyControl), Some(2.0)),
                row("3", "NEFL", None, Some(3.0)),
            ],
            Vec::new(),
        );

        let summary = summarize(&dataset);
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.unique_patients, 3);
        assert_eq!(summary.unique_biomarkers, 2);
        assert_eq!(
            summary.cohort_counts,
            vec![
                CohortCount {
                    cohort: Cohort::Parkinsons,
                    records: 2
                },
                CohortCount {
                    cohort: Cohort::HealthyControl,
                    records: 1
                },
            ]
        );
        assert_eq!(summary.top_biomarkers[0].test_name, "NEFL");
        assert_eq!(summary.top_biomarkers[0].records, 3);
        assert_eq!(summary.missing_values, 1);
        assert_eq!(summary.missing_percent, 25.0);
    }

    #[test]
    fn test_empty_dataset() {
        let summary = summarize(&MergedDataset::default());
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.missing_percent, 0.0);
        assert!(summary.top_biomarkers.is_empty());
    }
}
