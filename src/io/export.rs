//! Export the comparative detail table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets: ISO dates,
//! plain decimal amounts, signed variance.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::ComparisonRow;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    manager: &'a str,
    amount: Decimal,
    units: i64,
    variance: Decimal,
    purchase_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
}

impl<'a> From<&'a ComparisonRow> for ExportRow<'a> {
    fn from(row: &'a ComparisonRow) -> Self {
        Self {
            manager: &row.manager,
            amount: row.amount.round_dp(2),
            units: row.units,
            variance: row.variance.round_dp(2),
            purchase_date: row.purchase_date,
            return_date: row.return_date,
        }
    }
}

/// Write detail rows to a CSV file, in table order.
pub fn write_detail_csv(path: &Path, rows: &[ComparisonRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::input(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    for row in rows {
        writer
            .serialize(ExportRow::from(row))
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))?;

    info!(path = %path.display(), rows = rows.len(), "exported detail table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(manager: &str, amount: &str, variance: &str, purchase: Option<NaiveDate>) -> ComparisonRow {
        ComparisonRow {
            manager: manager.to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            units: 2,
            purchase_date: purchase,
            return_date: None,
            baseline_amount: Decimal::ZERO,
            variance: Decimal::from_str(variance).unwrap(),
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detail.csv");
        let rows = vec![
            row("Ana", "100", "20", NaiveDate::from_ymd_opt(2024, 3, 1)),
            row("Bo, Jr.", "50.5", "-12.25", None),
        ];

        write_detail_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "manager,amount,units,variance,purchase_date,return_date");
        assert_eq!(lines[1], "Ana,100,2,20,2024-03-01,");
        assert_eq!(lines[2], "\"Bo, Jr.\",50.5,2,-12.25,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn unwritable_path_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("detail.csv");
        let err = write_detail_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
