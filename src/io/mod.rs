//! Input/output helpers.
//!
//! - workbook ingest + coercion (`ingest`)
//! - memoized dataset loading (`cache`)
//! - detail table export (`export`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
