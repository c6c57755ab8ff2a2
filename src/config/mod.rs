//! Configuration for loading and exploring the biomarker dataset.
//!
//! Everything has a default matching the study's published file layout, so
//! a bare `ExplorerConfig::default()` with the right `base_path` is enough to
//! run. A JSON file can override any subset of fields.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{BiomarkerError, Result};
use crate::filter::FilterCriteria;

/// Release the default source URLs point at
pub const DEFAULT_BASE_URL: &str =
    "https://github.com/just4jc/ppmi-biomarker-dashboard/releases/download/v1.0.0";

/// Biomarkers shown by default in the distribution and correlation views
pub const DEFAULT_KEY_BIOMARKERS: [&str; 8] = [
    "CSF Alpha-synuclein",
    "ABeta 1-42",
    "pTau",
    "tTau",
    "ABeta42",
    "ABeta40",
    "pTau181",
    "Ptau217p",
];

/// A tabular input addressed by a path relative to the data directory and,
/// optionally, a URL to fetch it from when no local copy exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Short name used in logs and errors
    pub name: String,
    /// Path relative to `ExplorerConfig::base_path`
    pub relative_path: PathBuf,
    /// Remote location of the same file
    #[serde(default)]
    pub url: Option<String>,
}

impl DataSource {
    #[must_use]
    pub fn new(name: &str, relative_path: impl Into<PathBuf>, url: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            relative_path: relative_path.into(),
            url,
        }
    }

    /// File name used for the downloaded copy in the cache directory
    #[must_use]
    pub fn cache_file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map_or_else(|| format!("{}.csv", self.name), |n| n.to_string_lossy().into_owned())
    }
}

/// Locations of the six study tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    pub biomarker: DataSource,
    pub demographics: DataSource,
    pub age_at_visit: DataSource,
    pub clinical_diagnosis: DataSource,
    pub motor_assessment: DataSource,
    pub genetic: DataSource,
}

impl Default for SourceLayout {
    fn default() -> Self {
        let url = |file: &str| Some(format!("{DEFAULT_BASE_URL}/{file}"));
        Self {
            biomarker: DataSource::new(
                "biomarker",
                "biospecimen_analysis_results/Current_Biospecimen_Analysis_Results_18Sep2025.csv",
                url("Current_Biospecimen_Analysis_Results_18Sep2025.csv"),
            ),
            demographics: DataSource::new(
                "demographics",
                "core_patient_visit_info/Demographics_18Sep2025.csv",
                url("Demographics_18Sep2025.csv"),
            ),
            age_at_visit: DataSource::new(
                "age_at_visit",
                "core_patient_visit_info/Age_at_visit_18Sep2025.csv",
                url("Age_at_visit_18Sep2025.csv"),
            ),
            clinical_diagnosis: DataSource::new(
                "clinical_diagnosis",
                "clinical_motor_assessments/medical_history/Clinical_Diagnosis_18Sep2025.csv",
                url("Clinical_Diagnosis_18Sep2025.csv"),
            ),
            motor_assessment: DataSource::new(
                "motor_assessment",
                "clinical_motor_assessments/all_motor_mds_updrs/MDS-UPDRS_Part_III_18Sep2025.csv",
                url("MDS-UPDRS_Part_III_18Sep2025.csv"),
            ),
            genetic: DataSource::new(
                "genetic",
                "genetic_data/Genetic Data - Consensus APOE Genotype and Pathogenic Variants for LRRK2, GBA, VPS35, SNCA, PRKN, PARK7, and PINK1.csv",
                url(
                    "Genetic%20Data%20-%20Consensus%20APOE%20Genotype%20and%20Pathogenic%20Variants%20for%20LRRK2,%20GBA,%20VPS35,%20SNCA,%20PRKN,%20PARK7,%20and%20PINK1.csv",
                ),
            ),
        }
    }
}

/// Which biospecimen rows are kept at load time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomarkerSelection {
    /// Case-insensitive substrings matched against the test name
    pub keywords: Vec<String>,
    /// Projects whose rows are kept regardless of test name
    pub focus_projects: Vec<i64>,
}

impl Default for BiomarkerSelection {
    fn default() -> Self {
        let mut keywords: Vec<String> = [
            "synuclein", "tau", "p-tau", "ptau", "alpha", "aSyn", "amyloid", "abeta",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        keywords.extend(
            crate::algorithm::composite_score::PD_PROS_PANEL
                .iter()
                .map(|(protein, _)| (*protein).to_string()),
        );

        Self {
            keywords,
            focus_projects: vec![124, 125, 159, 172, 173, 207],
        }
    }
}

impl BiomarkerSelection {
    /// Keywords lowercased for matching
    #[must_use]
    pub fn keywords_lower(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.to_lowercase()).collect()
    }
}

/// Configuration for date format handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormatConfig {
    /// Date layouts tried in order
    pub date_formats: Vec<String>,
    /// Date-time layouts tried after the plain date layouts
    pub datetime_formats: Vec<String>,
    /// Enable heuristic format detection
    pub enable_format_detection: bool,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO format: 2023-01-15
                "%m/%d/%Y".to_string(), // US: 01/15/2023
                "%d-%b-%Y".to_string(), // 15-Jan-2023
                "%Y/%m/%d".to_string(), // 2023/01/15
                "%d.%m.%Y".to_string(), // 15.01.2023
                "%Y%m%d".to_string(),   // Compact: 20230115
                "%d %b %Y".to_string(), // 15 Jan 2023
            ],
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%m/%d/%Y %H:%M".to_string(),
            ],
            enable_format_detection: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Directory the source relative paths are resolved against
    pub base_path: PathBuf,
    /// Where downloaded sources are kept; defaults to `<base_path>/.cache`
    pub cache_dir: Option<PathBuf>,
    pub sources: SourceLayout,
    pub selection: BiomarkerSelection,
    pub key_biomarkers: Vec<String>,
    pub date_formats: DateFormatConfig,
    /// Filters applied when the caller does not pass any
    pub default_filters: FilterCriteria,
    /// Download sources that are missing locally
    pub allow_remote: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            cache_dir: None,
            sources: SourceLayout::default(),
            selection: BiomarkerSelection::default(),
            key_biomarkers: DEFAULT_KEY_BIOMARKERS.iter().map(ToString::to_string).collect(),
            date_formats: DateFormatConfig::default(),
            default_filters: FilterCriteria::default(),
            allow_remote: true,
        }
    }
}

impl ExplorerConfig {
    /// Configuration rooted at `base_path` with every other field defaulted
    #[must_use]
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Load a JSON configuration file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = crate::error::util::safe_open_file(path, "reading configuration")?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if self.selection.keywords.is_empty() && self.selection.focus_projects.is_empty() {
            return Err(BiomarkerError::InvalidConfig(
                "biomarker selection needs at least one keyword or focus project".to_string(),
            )
            .into());
        }
        if let Some((min, max)) = self.default_filters.age_range {
            if min > max {
                return Err(BiomarkerError::InvalidConfig(format!(
                    "age range minimum {min} exceeds maximum {max}"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Resolved cache directory
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.base_path.join(".cache"))
    }
}

impl fmt::Display for ExplorerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explorer Configuration:")?;
        writeln!(f, "  Data Directory: {}", self.base_path.display())?;
        writeln!(f, "  Cache Directory: {}", self.cache_dir().display())?;
        writeln!(f, "  Remote Download: {}", self.allow_remote)?;
        writeln!(f, "  Selection Keywords: {}", self.selection.keywords.len())?;
        writeln!(f, "  Focus Projects: {:?}", self.selection.focus_projects)?;
        writeln!(f, "  Key Biomarkers: {}", self.key_biomarkers.join(", "))?;
        write!(f, "{}", self.default_filters)
    }
}
