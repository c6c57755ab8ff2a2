//! Filtering of the merged dataset
//!
//! `generic` holds the composable `RecordFilter` framework; `criteria`
//! implements the cohort, age, sex and risk filters on top of it.

pub mod criteria;
pub mod generic;

pub use criteria::{AgeRangeFilter, CohortFilter, FilterCriteria, RiskGroupFilter, SexFilter};
pub use generic::{AndFilter, BoxedFilter, RecordFilter};
