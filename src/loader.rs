//! Loading the study sources and building the merged dataset
//!
//! `DatasetLoader` resolves each source to a file (local copy, cached
//! download, or a fresh download), reads the tables in parallel, adapts
//! them to the domain models and memoizes the results. The merged dataset
//! is built at most once per loader.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::anyhow;
use indicatif::ParallelProgressIterator;
use itertools::Itertools;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::algorithm::composite_score::CompositeScorer;
use crate::algorithm::merge::{available_motor_columns, merge};
use crate::algorithm::statistics::{mean, round_to, sample_std};
use crate::config::{DataSource, ExplorerConfig};
use crate::error::{BiomarkerError, Result};
use crate::models::adapters::{
    AgeAtVisitAdapter, BiomarkerAdapter, ClinicalDiagnosisAdapter, DemographicsAdapter,
    GeneticAdapter, MotorAssessmentAdapter, SourceAdapter,
};
use crate::models::{
    BiomarkerRecord, ClinicalData, Cohort, GeneticProfile, MergedDataset, MergedRecord,
};
use crate::reader::{Table, read_table};
use crate::utils::logging::{
    create_load_progress_bar, finish_progress_bar, log_load_complete, log_load_start, log_warning,
};

/// Aggregate of one biomarker within one cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiomarkerSummary {
    pub test_name: String,
    pub cohort: Cohort,
    /// Distinct patients with a record
    pub patients: usize,
    /// Records with a numeric value
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

/// Group records by (test name, cohort); records without a cohort are skipped
///
/// Means and standard deviations are rounded to two decimals.
#[must_use]
pub fn summarize_biomarkers(records: &[BiomarkerRecord]) -> Vec<BiomarkerSummary> {
    let mut groups: FxHashMap<(&str, Cohort), (FxHashSet<&str>, Vec<f64>)> =
        FxHashMap::default();
    for record in records {
        let Some(cohort) = record.cohort else {
            continue;
        };
        let (patients, values) = groups
            .entry((record.test_name.as_str(), cohort))
            .or_default();
        patients.insert(record.patno.as_str());
        if let Some(value) = record.value {
            values.push(value);
        }
    }

    groups
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|((test_name, cohort), (patients, values))| BiomarkerSummary {
            test_name: test_name.to_string(),
            cohort,
            patients: patients.len(),
            count: values.len(),
            mean: mean(&values).map(|m| round_to(m, 2)),
            std: sample_std(&values).map(|s| round_to(s, 2)),
        })
        .collect()
}

/// Loads, caches and merges the study tables
#[derive(Debug)]
pub struct DatasetLoader {
    config: ExplorerConfig,
    biomarkers: Option<Vec<BiomarkerRecord>>,
    clinical: Option<ClinicalData>,
    genetics: Option<Vec<GeneticProfile>>,
    merged: Option<MergedDataset>,
}

impl DatasetLoader {
    #[must_use]
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            biomarkers: None,
            clinical: None,
            genetics: None,
            merged: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Find a readable file for `source`, downloading it if allowed
    ///
    /// Looks at the local path under the data directory first, then at a
    /// previously downloaded copy in the cache directory.
    pub fn resolve_source(&self, source: &DataSource) -> Result<PathBuf> {
        let local = self.config.base_path.join(&source.relative_path);
        if local.is_file() {
            return Ok(local);
        }

        let cached = self.config.cache_dir().join(source.cache_file_name());
        if cached.is_file() {
            log::debug!("Using cached copy of {} at {}", source.name, cached.display());
            return Ok(cached);
        }

        let unavailable = |detail: String| BiomarkerError::SourceUnavailable {
            source_name: source.name.clone(),
            local: local.clone(),
            detail,
        };

        let Some(url) = source.url.as_deref() else {
            return Err(unavailable("no URL configured".to_string()).into());
        };
        if !self.config.allow_remote {
            return Err(unavailable(format!("remote download disabled, not fetching {url}")).into());
        }

        download_source(&source.name, url, &cached)
            .map_err(|e| unavailable(format!("download from {url} failed: {e:#}")))?;
        Ok(cached)
    }

    /// Resolve and read one source
    pub fn read_source(&self, source: &DataSource) -> Result<Table> {
        let start = Instant::now();
        let path = self.resolve_source(source)?;
        log_load_start(&source.name, &path);
        let table = read_table(&path, &source.name)?;
        log_load_complete(&source.name, &path, table.num_rows(), Some(start.elapsed()));
        Ok(table)
    }

    /// Read several sources in parallel, keeping their order
    fn read_sources(&self, sources: &[&DataSource]) -> Result<Vec<Table>> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let pb = create_load_progress_bar(sources.len() as u64, Some("Loading sources"))?;
        let tables = sources
            .par_iter()
            .progress_with(pb.clone())
            .map(|source| self.read_source(source))
            .collect::<Result<Vec<_>>>();
        finish_progress_bar(&pb, None);
        tables
    }

    fn adapt_biomarkers(&self, table: &Table) -> Result<Vec<BiomarkerRecord>> {
        if !table.has_column("TESTVALUE") {
            log_warning("Biomarker table has no TESTVALUE column; values will be missing", None);
        }
        if !table.has_column("COHORT") {
            log_warning("Biomarker table has no COHORT column; cohorts will be missing", None);
        }

        let adapter = BiomarkerAdapter::new(self.config.date_formats.clone());
        let records = adapter.adapt_table(table)?;
        let total = records.len();

        let keywords = self.config.selection.keywords_lower();
        let projects = &self.config.selection.focus_projects;
        let selected: Vec<BiomarkerRecord> = records
            .into_iter()
            .filter(|r| r.is_selected(&keywords, projects))
            .collect();

        log::info!(
            "Selected {} of {} biomarker records ({} distinct tests)",
            selected.len(),
            total,
            selected.iter().map(|r| r.test_name.as_str()).unique().count()
        );
        Ok(selected)
    }

    fn adapt_clinical(tables: [Table; 4]) -> Result<ClinicalData> {
        let [demographics, age_at_visit, diagnosis, motor] = tables;
        let motor_columns = available_motor_columns(|c| motor.has_column(c));

        Ok(ClinicalData {
            demographics: DemographicsAdapter.adapt_table(&demographics)?,
            age_at_visit: AgeAtVisitAdapter.adapt_table(&age_at_visit)?,
            diagnosis: ClinicalDiagnosisAdapter.adapt_table(&diagnosis)?,
            motor: MotorAssessmentAdapter.adapt_table(&motor)?,
            motor_columns,
        })
    }

    fn adapt_genetics(table: &Table) -> Result<Vec<GeneticProfile>> {
        if !table.has_column("PATHVAR_COUNT") {
            log_warning(
                "Genetic table has no PATHVAR_COUNT column; every participant is standard risk",
                None,
            );
        }
        GeneticAdapter.adapt_table(table)
    }

    /// Biomarker records in the configured selection
    pub fn load_biomarkers(&mut self) -> Result<&[BiomarkerRecord]> {
        let records = match self.biomarkers.take() {
            Some(records) => records,
            None => {
                let table = self.read_source(&self.config.sources.biomarker)?;
                self.adapt_biomarkers(&table)?
            }
        };
        Ok(self.biomarkers.insert(records).as_slice())
    }

    /// Demographics, age at visit, diagnoses and motor assessments
    pub fn load_clinical(&mut self) -> Result<&ClinicalData> {
        let clinical = match self.clinical.take() {
            Some(clinical) => clinical,
            None => {
                let layout = &self.config.sources;
                let tables = self.read_sources(&[
                    &layout.demographics,
                    &layout.age_at_visit,
                    &layout.clinical_diagnosis,
                    &layout.motor_assessment,
                ])?;
                Self::adapt_clinical(into_array(tables)?)?
            }
        };
        Ok(&*self.clinical.insert(clinical))
    }

    /// Genetic profiles with risk groups
    pub fn load_genetic(&mut self) -> Result<&[GeneticProfile]> {
        let genetics = match self.genetics.take() {
            Some(genetics) => genetics,
            None => {
                let table = self.read_source(&self.config.sources.genetic)?;
                Self::adapt_genetics(&table)?
            }
        };
        Ok(self.genetics.insert(genetics).as_slice())
    }

    /// Read every source that is not cached yet, all in parallel
    fn preload(&mut self) -> Result<()> {
        let layout = &self.config.sources;
        let mut wanted: Vec<&DataSource> = Vec::with_capacity(6);
        if self.biomarkers.is_none() {
            wanted.push(&layout.biomarker);
        }
        if self.clinical.is_none() {
            wanted.extend([
                &layout.demographics,
                &layout.age_at_visit,
                &layout.clinical_diagnosis,
                &layout.motor_assessment,
            ]);
        }
        if self.genetics.is_none() {
            wanted.push(&layout.genetic);
        }

        let mut tables = self.read_sources(&wanted)?.into_iter();
        if self.biomarkers.is_none() {
            let table = next_table(&mut tables)?;
            self.biomarkers = Some(self.adapt_biomarkers(&table)?);
        }
        if self.clinical.is_none() {
            let clinical_tables = [
                next_table(&mut tables)?,
                next_table(&mut tables)?,
                next_table(&mut tables)?,
                next_table(&mut tables)?,
            ];
            self.clinical = Some(Self::adapt_clinical(clinical_tables)?);
        }
        if self.genetics.is_none() {
            let table = next_table(&mut tables)?;
            self.genetics = Some(Self::adapt_genetics(&table)?);
        }
        Ok(())
    }

    fn build_merged(&mut self) -> Result<MergedDataset> {
        let start = Instant::now();
        self.preload()?;

        let (Some(biomarkers), Some(clinical), Some(genetics)) =
            (&self.biomarkers, &self.clinical, &self.genetics)
        else {
            return Err(anyhow!("sources missing after preload"));
        };

        let mut dataset = merge(biomarkers, clinical, genetics);
        CompositeScorer::default().attach(&mut dataset);
        log::info!(
            "Built merged dataset: {} records, {} patients in {:?}",
            dataset.len(),
            dataset.patient_count(),
            start.elapsed()
        );
        Ok(dataset)
    }

    /// The merged dataset with composite scores, built on first use
    pub fn merged_dataset(&mut self) -> Result<&MergedDataset> {
        let dataset = match self.merged.take() {
            Some(dataset) => dataset,
            None => self.build_merged()?,
        };
        Ok(&*self.merged.insert(dataset))
    }

    /// Per (test, cohort) aggregates over the selected biomarker records
    pub fn biomarker_summary(&mut self) -> Result<Vec<BiomarkerSummary>> {
        Ok(summarize_biomarkers(self.load_biomarkers()?))
    }

    /// Merged records of the named biomarkers, or of the configured key
    /// biomarkers when `names` is `None`
    pub fn key_biomarker_records(&mut self, names: Option<&[String]>) -> Result<Vec<MergedRecord>> {
        let names: Vec<String> =
            names.map_or_else(|| self.config.key_biomarkers.clone(), <[String]>::to_vec);
        let dataset = self.merged_dataset()?;
        let wanted: FxHashSet<&str> = names.iter().map(String::as_str).collect();

        let records: Vec<MergedRecord> = dataset
            .iter()
            .filter(|r| wanted.contains(r.test_name()))
            .cloned()
            .collect();
        if records.is_empty() {
            log_warning(
                &format!("No records found for biomarkers: {}", names.join(", ")),
                None,
            );
        }
        Ok(records)
    }
}

fn next_table(tables: &mut impl Iterator<Item = Table>) -> Result<Table> {
    tables
        .next()
        .ok_or_else(|| anyhow!("fewer tables read than sources requested"))
}

fn into_array<const N: usize>(tables: Vec<Table>) -> Result<[Table; N]> {
    let count = tables.len();
    tables
        .try_into()
        .map_err(|_| anyhow!("expected {N} tables, read {count}"))
}

/// Fetch `url` into `dest`, writing through a temporary file
#[cfg(feature = "remote")]
fn download_source(name: &str, url: &str, dest: &Path) -> Result<()> {
    use anyhow::Context;

    use crate::error::util::ensure_directory;
    use crate::utils::logging::create_spinner;

    if let Some(parent) = dest.parent() {
        ensure_directory(parent, "caching downloaded sources")?;
    }

    let partial = dest.with_extension("part");
    let spinner = create_spinner(&format!("Downloading {name}"))?;
    let result = fetch_to_file(url, &partial).and_then(|bytes| {
        std::fs::rename(&partial, dest)
            .with_context(|| format!("Failed to move download to {}", dest.display()))?;
        Ok(bytes)
    });
    finish_progress_bar(&spinner, None);

    match result {
        Ok(bytes) => {
            log::info!("Downloaded {name} ({bytes} bytes) to {}", dest.display());
            Ok(())
        }
        Err(err) => {
            if partial.exists() {
                if let Err(remove_err) = std::fs::remove_file(&partial) {
                    log::warn!("Failed to remove {}: {remove_err}", partial.display());
                }
            }
            Err(err)
        }
    }
}

/// Stream the body of `url` into `path`, returning the byte count
#[cfg(feature = "remote")]
fn fetch_to_file(url: &str, path: &Path) -> Result<u64> {
    use anyhow::Context;

    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("biomarker-explorer/{}", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(600))
        .build()
        .context("Failed to create HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("Server rejected request for {url}"))?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    response
        .copy_to(&mut file)
        .with_context(|| format!("Failed to download {url}"))
}

#[cfg(not(feature = "remote"))]
fn download_source(_name: &str, _url: &str, _dest: &Path) -> Result<()> {
    Err(anyhow!("built without the `remote` feature"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientId;

    fn record(patno: &str, test: &str, cohort: Option<Cohort>, value: Option<f64>) -> BiomarkerRecord {
        let mut record = BiomarkerRecord::new(PatientId::parse(patno).unwrap(), test, value);
        record.cohort = cohort;
        record
    }

    #[test]
    fn test_summary_groups_by_test_and_cohort() {
        let records = vec![
            record("1", "NEFL", Some(Cohort::Parkinsons), Some(1.0)),
            record("1", "NEFL", Some(Cohort::Parkinsons), Some(2.0)),
            record("2", "NEFL", Some(Cohort::Parkinsons), None),
            record("3", "NEFL", Some(Cohort::HealthyControl), Some(4.0)),
            record("4", "NEFL", None, Some(100.0)),
        ];
        let summary = summarize_biomarkers(&records);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].cohort, Cohort::HealthyControl);
        assert_eq!(summary[0].std, None);
        let pd = &summary[1];
        assert_eq!(pd.patients, 2);
        assert_eq!(pd.count, 2);
        assert_eq!(pd.mean, Some(1.5));
        assert_eq!(pd.std, Some(0.71));
    }

    #[test]
    fn test_missing_source_without_remote_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExplorerConfig::with_base_path(dir.path());
        config.allow_remote = false;
        let loader = DatasetLoader::new(config);

        let err = loader
            .resolve_source(&loader.config().sources.genetic)
            .unwrap_err();
        let source_err = err.downcast_ref::<BiomarkerError>().unwrap();
        assert!(matches!(source_err, BiomarkerError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_cached_copy_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExplorerConfig::with_base_path(dir.path());
        config.allow_remote = false;
        let cache = config.cache_dir();
        std::fs::create_dir_all(&cache).unwrap();
        let cached = cache.join(config.sources.genetic.cache_file_name());
        std::fs::write(&cached, "PATNO,PATHVAR_COUNT\n1,0\n").unwrap();

        let loader = DatasetLoader::new(config);
        let resolved = loader.resolve_source(&loader.config().sources.genetic).unwrap();
        assert_eq!(resolved, cached);
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_interrupted_download_leaves_no_partial_file() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).unwrap();
            // promises more bytes than it sends, then hangs up
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nPATNO\n")
                .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache").join("genetic.csv");
        let url = format!("http://127.0.0.1:{port}/genetic.csv");

        assert!(download_source("genetic", &url, &dest).is_err());
        server.join().unwrap();
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
