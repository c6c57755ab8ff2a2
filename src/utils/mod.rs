//! Shared helpers: Arrow column access and value coercion, logging and
//! progress reporting

pub mod arrow;
pub mod logging;
