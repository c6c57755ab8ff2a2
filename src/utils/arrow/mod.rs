//! Arrow data handling utilities
//!
//! Column access on record batches and coercion of string cells to typed
//! values.

pub mod array_utils;
pub mod extractors;

pub use array_utils::{get_column, string_column, to_utf8, value_at};
pub use extractors::{parse_date, parse_f64, parse_i64, parse_month_year};
