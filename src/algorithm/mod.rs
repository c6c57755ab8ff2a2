//! Core transformations of the explorer
//!
//! Joining sources into the merged dataset, the PD proteomic composite
//! score and the statistics used by the analysis views.

pub mod composite_score;
pub mod merge;
pub mod statistics;
