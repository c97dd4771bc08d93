//! Source configuration.
//!
//! The workbook path and sheet come from CLI flags, which fall back to the
//! `RMA_WORKBOOK` / `RMA_SHEET` environment variables (optionally set in a
//! `.env` file) and finally to the built-in defaults.

use std::path::PathBuf;

use crate::cli::SourceArgs;
use crate::domain::{SourceKey, DEFAULT_SHEET, DEFAULT_WORKBOOK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub sheet: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_WORKBOOK),
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn from_args(args: &SourceArgs) -> Self {
        Self {
            path: args.file.clone(),
            sheet: args.sheet.clone(),
        }
    }

    /// Cache identity for this source.
    pub fn key(&self) -> SourceKey {
        SourceKey::new(self.path.clone(), self.sheet.clone())
    }
}

/// Load `.env` into the process environment if one exists.
///
/// Must run before argument parsing so env-backed flags see the values.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}
