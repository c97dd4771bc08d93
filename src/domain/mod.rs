//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loaded spreadsheet rows (`Record`) and the immutable `Dataset`
//! - the workbook identity (`SourceKey`) used for caching
//! - aggregation outputs (`Totals`, `Summary`, `ComparisonRow`, etc.)

pub mod types;

pub use types::*;
