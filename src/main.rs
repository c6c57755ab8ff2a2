use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, anyhow};
use biomarker_explorer::analysis::{
    CorrelationTarget, clinical_distribution, composite_report, correlation, distribution, heatmap,
    longitudinal, summarize,
};
use biomarker_explorer::utils::logging::console::print_json;
use biomarker_explorer::{
    ClinicalVariable, Cohort, DatasetLoader, ExplorerConfig, FilterCriteria, MergedDataset,
    Result, RiskGroup, Sex, export_csv,
};
use clap::{Args, Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(
    name = "biomarker-explorer",
    version,
    about = "Explore biomarker, clinical and genetic study data"
)]
struct Cli {
    /// Directory the source files are resolved against
    #[arg(long, global = true, env = "BIOMARKER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never download missing sources
    #[arg(long, global = true)]
    no_remote: bool,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Keep only these cohorts (HC, PD, "Prodromal PD", SWEDD)
    #[arg(long = "cohort", global = true, value_parser = parse_cohort)]
    cohorts: Vec<Cohort>,

    /// Minimum age at biomarker collection, inclusive
    #[arg(long, global = true)]
    age_min: Option<f64>,

    /// Maximum age at biomarker collection, inclusive
    #[arg(long, global = true)]
    age_max: Option<f64>,

    /// Keep only these sexes (Male, Female)
    #[arg(long = "sex", global = true, value_parser = parse_sex)]
    sexes: Vec<Sex>,

    /// Keep only these genetic risk groups ("High Risk", "Standard Risk")
    #[arg(long = "risk-group", global = true, value_parser = parse_risk_group)]
    risk_groups: Vec<RiskGroup>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        let age_range = match (self.age_min, self.age_max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY))),
        };
        FilterCriteria {
            cohorts: non_empty(&self.cohorts),
            age_range,
            sexes: non_empty(&self.sexes),
            risk_groups: non_empty(&self.risk_groups),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Dataset overview: records, patients, cohorts and missing values
    Summary,
    /// Per biomarker and cohort patient counts, means and spread
    Biomarkers,
    /// Distribution by cohort with rank tests
    Distribution {
        /// Biomarker name, motor score column (NP3TOT, ...), AGE_AT_BIOMARKER or PD_PROS
        variable: String,
        /// Cohorts to compare; HC, PD and Prodromal PD when omitted
        #[arg(long = "group", value_parser = parse_cohort)]
        groups: Vec<Cohort>,
    },
    /// Biomarker level against age at collection
    Trend {
        biomarker: String,
        /// Cohorts to include; HC, PD and Prodromal PD when omitted
        #[arg(long = "group", value_parser = parse_cohort)]
        groups: Vec<Cohort>,
    },
    /// Correlate a biomarker with another biomarker or a clinical variable
    Correlate {
        biomarker: String,
        /// Biomarker name, motor score column (NP3TOT, ...), AGE_AT_BIOMARKER or PD_PROS
        target: String,
    },
    /// Pairwise correlation matrix
    Heatmap {
        /// Biomarkers to include; the configured key biomarkers when omitted
        #[arg(long = "biomarker")]
        biomarkers: Vec<String>,
        /// Clinical variables to include; every available motor score when omitted
        #[arg(long = "variable", value_parser = parse_clinical_variable)]
        variables: Vec<ClinicalVariable>,
    },
    /// PD proteomic composite score by cohort and against motor severity
    Score,
    /// Write the filtered merged dataset to CSV
    Export {
        /// Output file
        #[arg(short, long, default_value = "merged_biomarker_data.csv")]
        output: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn parse_cohort(value: &str) -> std::result::Result<Cohort, String> {
    Cohort::from_label(value).ok_or_else(|| format!("unknown cohort '{value}'"))
}

fn parse_sex(value: &str) -> std::result::Result<Sex, String> {
    Sex::from_label(value).ok_or_else(|| format!("unknown sex '{value}'"))
}

fn parse_risk_group(value: &str) -> std::result::Result<RiskGroup, String> {
    RiskGroup::from_label(value).ok_or_else(|| format!("unknown risk group '{value}'"))
}

fn parse_clinical_variable(value: &str) -> std::result::Result<ClinicalVariable, String> {
    ClinicalVariable::from_name(value).ok_or_else(|| format!("unknown clinical variable '{value}'"))
}

fn load_config(cli: &Cli) -> Result<ExplorerConfig> {
    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::from_json_file(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.base_path.clone_from(dir);
    }
    if cli.no_remote {
        config.allow_remote = false;
    }
    config.validate()?;
    Ok(config)
}

/// The merged dataset narrowed by the command line filters, falling back
/// to the configured default filters for anything not given
fn filtered_dataset(loader: &mut DatasetLoader, filters: &FilterArgs) -> Result<MergedDataset> {
    let criteria = filters.criteria().or(&loader.config().default_filters);
    if let Some((min, max)) = criteria.age_range {
        if min > max {
            return Err(anyhow!("--age-min {min} exceeds --age-max {max}"));
        }
    }
    let dataset = loader.merged_dataset()?;
    if criteria.is_empty() {
        return Ok(dataset.clone());
    }
    let filtered = criteria.apply(dataset);
    info!(
        "Filters kept {} of {} records ({} patients)",
        filtered.len(),
        dataset.len(),
        filtered.patient_count()
    );
    Ok(filtered)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    if matches!(cli.command, Commands::Config) {
        println!("{config}");
        return Ok(());
    }

    let mut loader = DatasetLoader::new(config);
    match &cli.command {
        Commands::Summary => {
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            print_json(&summarize(&dataset))
        }
        Commands::Biomarkers => print_json(&loader.biomarker_summary()?),
        Commands::Distribution { variable, groups } => {
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            let report = match CorrelationTarget::parse(variable) {
                CorrelationTarget::Biomarker(name) => distribution(&dataset, &name, groups)?,
                CorrelationTarget::Clinical(clinical) => {
                    clinical_distribution(&dataset, clinical, groups)?
                }
            };
            print_json(&report)
        }
        Commands::Trend { biomarker, groups } => {
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            print_json(&longitudinal(&dataset, biomarker, groups)?)
        }
        Commands::Correlate { biomarker, target } => {
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            print_json(&correlation(&dataset, biomarker, &CorrelationTarget::parse(target))?)
        }
        Commands::Heatmap {
            biomarkers,
            variables,
        } => {
            let biomarkers = if biomarkers.is_empty() {
                loader.config().key_biomarkers.clone()
            } else {
                biomarkers.clone()
            };
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            let variables = if variables.is_empty() {
                dataset
                    .motor_scores()
                    .iter()
                    .map(|score| ClinicalVariable::Motor(*score))
                    .collect()
            } else {
                variables.clone()
            };
            print_json(&heatmap(&dataset, &biomarkers, &variables)?)
        }
        Commands::Score => {
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            print_json(&composite_report(&dataset)?)
        }
        Commands::Export { output } => {
            let dataset = filtered_dataset(&mut loader, &cli.filters)?;
            let rows = export_csv(&dataset, output)
                .with_context(|| format!("Failed to export to {}", output.display()))?;
            info!("Exported {rows} rows to {}", output.display());
            Ok(())
        }
        Commands::Config => Ok(()),
    }
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let start = Instant::now();
    run(&cli)?;
    info!("Finished in {:?}", start.elapsed());
    Ok(())
}
