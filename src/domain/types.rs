//! Shared domain types.
//!
//! These types are intentionally kept plain and serializable so they can be:
//!
//! - built once by the loader and shared read-only across recomputations
//! - rendered by both the TUI and the text report
//! - exported to CSV

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Header of the week column.
pub const COL_WEEK: &str = "SEMANA";
/// Header of the agent column.
pub const COL_AGENT: &str = "AGENTE";
/// Header of the manager column.
pub const COL_MANAGER: &str = "GESTOR";
/// Header of the monetary amount column (USD).
pub const COL_AMOUNT: &str = "COSTO_USD+";
/// Header of the unit count column.
pub const COL_UNITS: &str = "CANTIDAD_REGISTROS";
/// Header of the optional purchase date column.
pub const COL_PURCHASE_DATE: &str = "FECHA_COMPRA";
/// Header of the optional sale date column.
pub const COL_SALE_DATE: &str = "FECHA_VENTA";
/// Header of the optional return (RMA) date column.
pub const COL_RETURN_DATE: &str = "FECHA_RMA";

/// Default workbook file name, relative to the working directory.
pub const DEFAULT_WORKBOOK: &str = "ReporteSemanalMovimientos.xlsx";
/// Default sheet inside the workbook.
pub const DEFAULT_SHEET: &str = "Bruto Reportes Nuevo";

/// One row of the weekly movements sheet.
///
/// `amount` and `units` are always numeric: the loader substitutes `0` for
/// anything it cannot parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub agent: String,
    pub week: String,
    pub manager: String,
    pub amount: Decimal,
    pub units: i64,
    pub purchase_date: Option<NaiveDate>,
    pub sale_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

/// All rows of one sheet, in sheet order. Immutable after load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Identity of a loadable source: workbook path + sheet name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    pub path: PathBuf,
    pub sheet: String,
}

impl SourceKey {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.path.display(), self.sheet)
    }
}

/// The two weeks being compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekPair {
    pub current: String,
    pub baseline: String,
}

/// Scalar totals of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub amount: Decimal,
    pub units: i64,
    pub rows: usize,
}

/// Inputs of the four summary indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub current: Totals,
    pub baseline: Totals,
    /// `current.amount - baseline.amount`
    pub amount_delta: Decimal,
    /// `current.units - baseline.units`
    pub units_delta: i64,
    pub weeks: WeekPair,
}

/// Manager → summed amount of one snapshot.
pub type GroupSummary = BTreeMap<String, Decimal>;

/// One row of the comparative detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub manager: String,
    pub amount: Decimal,
    pub units: i64,
    pub purchase_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    /// Baseline group total for `manager` (0 when the manager has no baseline rows).
    ///
    /// Only used to compute `variance`; never displayed.
    #[serde(skip)]
    pub baseline_amount: Decimal,
    /// `amount - baseline_amount`
    pub variance: Decimal,
}

/// One bar/slice of the per-manager distribution charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareEntry {
    pub manager: String,
    pub amount: Decimal,
}
