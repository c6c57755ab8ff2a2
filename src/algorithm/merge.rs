//! Joining the study tables into the merged analysis dataset
//!
//! Biomarker rows drive the join. Demographics and genetics are attached
//! from the first row seen per patient, motor scores are averaged per
//! patient, and the age at collection is derived from the run date and
//! birth month.

use rustc_hash::FxHashMap;

use crate::models::{
    BiomarkerRecord, ClinicalData, Demographics, GeneticProfile, MergedDataset, MergedRecord,
    MotorScore, MotorScores, PatientId,
};
use crate::utils::logging::log_warning;

/// First row per patient, in input order
fn first_per_patient<T, F>(rows: &[T], key: F) -> FxHashMap<&PatientId, &T>
where
    F: Fn(&T) -> &PatientId,
{
    let mut map = FxHashMap::default();
    for row in rows {
        map.entry(key(row)).or_insert(row);
    }
    map
}

/// Per-patient mean of every available motor score column
#[must_use]
pub fn mean_motor_scores(clinical: &ClinicalData) -> FxHashMap<PatientId, MotorScores> {
    let mut sums: FxHashMap<&PatientId, Vec<(f64, usize)>> = FxHashMap::default();
    for assessment in &clinical.motor {
        let cells = sums
            .entry(&assessment.patno)
            .or_insert_with(|| vec![(0.0, 0); clinical.motor_columns.len()]);
        for (slot, score) in clinical.motor_columns.iter().enumerate() {
            if let Some(value) = assessment.scores.get(*score) {
                cells[slot].0 += value;
                cells[slot].1 += 1;
            }
        }
    }

    sums.into_iter()
        .map(|(patno, cells)| {
            let mut scores = MotorScores::default();
            for (score, (sum, count)) in clinical.motor_columns.iter().zip(cells) {
                if count > 0 {
                    scores.set(*score, Some(sum / count as f64));
                }
            }
            (patno.clone(), scores)
        })
        .collect()
}

/// Join biomarker records with the clinical and genetic tables
///
/// Records whose patient has no demographics row are dropped.
#[must_use]
pub fn merge(
    biomarkers: &[BiomarkerRecord],
    clinical: &ClinicalData,
    genetics: &[GeneticProfile],
) -> MergedDataset {
    let demographics = first_per_patient(&clinical.demographics, |d: &Demographics| &d.patno);
    let profiles = first_per_patient(genetics, |g: &GeneticProfile| &g.patno);
    let motor = mean_motor_scores(clinical);

    let mut visit_ages: FxHashMap<(&PatientId, &str), f64> = FxHashMap::default();
    for visit in &clinical.age_at_visit {
        if let (Some(event), Some(age)) = (visit.event_id.as_deref(), visit.age_at_visit) {
            visit_ages.entry((&visit.patno, event)).or_insert(age);
        }
    }

    let mut dropped = 0usize;
    let mut records = Vec::with_capacity(biomarkers.len());
    for biomarker in biomarkers {
        let Some(demo) = demographics.get(&biomarker.patno) else {
            dropped += 1;
            continue;
        };

        let mut record = MergedRecord::from_biomarker(biomarker.clone());
        record.sex = demo.sex;
        record.birth_date = demo.birth_date;
        record.handed = demo.handed;
        record.hisplat = demo.hisplat;
        record.rawhite = demo.rawhite;
        record.rablack = demo.rablack;
        record.raasian = demo.raasian;

        if let Some(profile) = profiles.get(&biomarker.patno) {
            record.apoe.clone_from(&profile.apoe);
            record.pathvar_count = profile.pathvar_count;
            record.lrrk2.clone_from(&profile.lrrk2);
            record.gba.clone_from(&profile.gba);
            record.snca.clone_from(&profile.snca);
            record.risk_group = Some(profile.risk_group);
        }

        record.age_at_biomarker = biomarker
            .run_date
            .and_then(|run| demo.age_at(run))
            .or_else(|| {
                let event = biomarker.clinical_event.as_deref()?;
                visit_ages.get(&(&biomarker.patno, event)).copied()
            });

        if let Some(scores) = motor.get(&biomarker.patno) {
            record.motor = *scores;
        }

        records.push(record);
    }

    if dropped > 0 {
        log_warning(
            &format!("Dropped {dropped} biomarker records without a demographics row"),
            None,
        );
    }
    log::info!(
        "Merged {} biomarker records for {} patients",
        records.len(),
        demographics.len()
    );

    MergedDataset::new(records, clinical.motor_columns.clone())
}

/// Motor score columns to aggregate, warning about the absent ones
#[must_use]
pub fn available_motor_columns<F>(has_column: F) -> Vec<MotorScore>
where
    F: Fn(&str) -> bool,
{
    let (present, missing): (Vec<MotorScore>, Vec<MotorScore>) =
        MotorScore::ALL.into_iter().partition(|s| has_column(s.column()));
    if !missing.is_empty() {
        log_warning(
            &format!(
                "Motor assessment columns not found: {}",
                missing.iter().map(|s| s.column()).collect::<Vec<_>>().join(", ")
            ),
            None,
        );
    }
    present
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{AgeAtVisit, MotorAssessment, RiskGroup, Sex};

    fn id(raw: &str) -> PatientId {
        PatientId::parse(raw).unwrap()
    }

    fn demo(patno: &str, sex: Sex, birth: Option<NaiveDate>) -> Demographics {
        let mut d = Demographics::new(id(patno));
        d.sex = Some(sex);
        d.birth_date = birth;
        d
    }

    fn assessment(patno: &str, total: Option<f64>) -> MotorAssessment {
        let mut scores = MotorScores::default();
        scores.set(MotorScore::Total, total);
        MotorAssessment {
            patno: id(patno),
            event_id: None,
            scores,
        }
    }

    fn clinical() -> ClinicalData {
        ClinicalData {
            demographics: vec![
                demo("1", Sex::Male, NaiveDate::from_ymd_opt(1950, 1, 1)),
                demo("1", Sex::Female, None),
                demo("2", Sex::Female, None),
            ],
            age_at_visit: vec![AgeAtVisit {
                patno: id("2"),
                event_id: Some("BL".to_string()),
                age_at_visit: Some(61.5),
            }],
            diagnosis: Vec::new(),
            motor: vec![
                assessment("1", Some(10.0)),
                assessment("1", Some(20.0)),
                assessment("1", None),
            ],
            motor_columns: vec![MotorScore::Total],
        }
    }

    #[test]
    fn test_merge_drops_patients_without_demographics() {
        let biomarkers = vec![
            BiomarkerRecord::new(id("1"), "NEFL", Some(1.0)),
            BiomarkerRecord::new(id("3"), "NEFL", Some(2.0)),
        ];
        let dataset = merge(&biomarkers, &clinical(), &[]);

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].patno(), &id("1"));
        // first demographics row wins
        assert_eq!(dataset.records()[0].sex, Some(Sex::Male));
        assert_eq!(dataset.records()[0].risk_group, None);
    }

    #[test]
    fn test_motor_scores_are_patient_means() {
        let biomarkers = vec![
            BiomarkerRecord::new(id("1"), "NEFL", Some(1.0)),
            BiomarkerRecord::new(id("2"), "NEFL", Some(1.0)),
        ];
        let dataset = merge(&biomarkers, &clinical(), &[]);

        assert_eq!(dataset.records()[0].motor.np3tot, Some(15.0));
        assert_eq!(dataset.records()[0].motor.np3brady, None);
        assert_eq!(dataset.records()[1].motor.np3tot, None);
        assert_eq!(dataset.motor_scores(), &[MotorScore::Total]);
    }

    #[test]
    fn test_age_from_run_date_or_visit_table() {
        let mut with_date = BiomarkerRecord::new(id("1"), "NEFL", Some(1.0));
        with_date.run_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let mut by_event = BiomarkerRecord::new(id("2"), "NEFL", Some(1.0));
        by_event.clinical_event = Some("BL".to_string());
        let unknown = BiomarkerRecord::new(id("2"), "GFAP", Some(1.0));

        let dataset = merge(&[with_date, by_event, unknown], &clinical(), &[]);
        let ages: Vec<Option<f64>> = dataset.iter().map(|r| r.age_at_biomarker).collect();

        assert!((ages[0].unwrap() - 25567.0 / 365.25).abs() < 1e-9);
        assert_eq!(ages[1], Some(61.5));
        assert_eq!(ages[2], None);
    }

    #[test]
    fn test_genetics_attach_risk_group() {
        let mut profile = GeneticProfile::new(id("1"), Some(1.0));
        profile.apoe = Some("E3/E4".to_string());
        let biomarkers = vec![BiomarkerRecord::new(id("1"), "NEFL", Some(1.0))];

        let dataset = merge(&biomarkers, &clinical(), &[profile]);
        let record = &dataset.records()[0];

        assert_eq!(record.risk_group, Some(RiskGroup::High));
        assert_eq!(record.apoe.as_deref(), Some("E3/E4"));
    }

    #[test]
    fn test_available_motor_columns() {
        let columns = available_motor_columns(|c| c == "NP3TOT" || c == "NP3RIGN");
        assert_eq!(columns, vec![MotorScore::Total, MotorScore::NeckRigidity]);
    }
}
