//! Data behind the explorer views
//!
//! Each function takes the (filtered) merged dataset and returns a
//! serializable report: group statistics, points, regression lines and
//! correlation coefficients.

pub mod composite;
pub mod correlation;
pub mod distribution;
pub mod longitudinal;
pub mod summary;

pub use composite::{CompositeReport, composite_report};
pub use correlation::{
    CorrelationPoint, CorrelationReport, CorrelationTarget, HeatmapReport, correlation, heatmap,
};
pub use distribution::{
    CohortComparison, CohortDistribution, DistributionReport, clinical_distribution, distribution,
};
pub use longitudinal::{CohortTrend, LongitudinalReport, TrendPoint, longitudinal};
pub use summary::{DatasetSummary, summarize};

use crate::models::Cohort;

/// Cohorts shown when the caller does not choose any
pub const DEFAULT_COHORTS: [Cohort; 3] =
    [Cohort::HealthyControl, Cohort::Parkinsons, Cohort::Prodromal];

/// Correlations are only reported above this many points
pub const MIN_CORRELATION_POINTS: usize = 5;

/// The requested cohorts, or the defaults when none were requested
#[must_use]
pub fn resolve_cohorts(cohorts: &[Cohort]) -> Vec<Cohort> {
    if cohorts.is_empty() {
        DEFAULT_COHORTS.to_vec()
    } else {
        cohorts.to_vec()
    }
}
