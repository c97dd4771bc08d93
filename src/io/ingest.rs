//! Workbook ingest and normalization.
//!
//! This module turns one sheet of the weekly movements workbook into a clean
//! `Dataset`:
//!
//! - **Strict schema** for the five required columns (a missing one fails the load)
//! - **Lenient cells**: unparseable numbers become `0`, unparseable dates `None`
//! - **One failure mode** for callers of `load_dataset`: any error yields the
//!   empty dataset, the reason only goes to the log

use std::collections::HashMap;
use std::str::FromStr;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{
    Dataset, Record, SourceKey, COL_AGENT, COL_AMOUNT, COL_MANAGER, COL_PURCHASE_DATE, COL_RETURN_DATE,
    COL_SALE_DATE, COL_UNITS, COL_WEEK,
};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 5] = [COL_WEEK, COL_AGENT, COL_MANAGER, COL_AMOUNT, COL_UNITS];

/// Counters describing how much coercion a load needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_used: usize,
    pub blank_rows: usize,
    /// Amount cells that were not numeric and were replaced by `0`.
    pub amount_defaults: usize,
    /// Unit cells that were not numeric and were replaced by `0`.
    pub unit_defaults: usize,
    /// Non-empty date cells that could not be parsed.
    pub bad_dates: usize,
}

/// Load a sheet, collapsing every failure into the empty dataset.
pub fn load_dataset(source: &SourceKey) -> Dataset {
    match try_load_dataset(source) {
        Ok(dataset) => dataset,
        Err(err) => {
            warn!(source = %source, "workbook load failed: {err}");
            Dataset::empty()
        }
    }
}

/// Load a sheet and report why it failed, if it did.
pub fn try_load_dataset(source: &SourceKey) -> Result<Dataset, AppError> {
    let mut workbook = open_workbook_auto(source.path()).map_err(|e| {
        AppError::input(format!(
            "Failed to open workbook '{}': {e}",
            source.path().display()
        ))
    })?;

    let range = workbook
        .worksheet_range(&source.sheet)
        .map_err(|e| AppError::input(format!("Failed to read sheet '{}': {e}", source.sheet)))?;

    let (records, stats) = records_from_range(&range)?;
    info!(
        source = %source,
        rows = stats.rows_used,
        "loaded workbook"
    );
    debug!(?stats, "ingest coercion counters");
    Ok(Dataset::new(records))
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    week: usize,
    agent: usize,
    manager: usize,
    amount: usize,
    units: usize,
    purchase_date: Option<usize>,
    sale_date: Option<usize>,
    return_date: Option<usize>,
}

impl Columns {
    fn resolve(header_map: &HashMap<String, usize>) -> Result<Self, AppError> {
        for name in REQUIRED_COLUMNS {
            if !header_map.contains_key(name) {
                return Err(AppError::input(format!("Missing required column: `{name}`")));
            }
        }
        let at = |name: &str| header_map.get(name).copied();
        Ok(Self {
            week: header_map[COL_WEEK],
            agent: header_map[COL_AGENT],
            manager: header_map[COL_MANAGER],
            amount: header_map[COL_AMOUNT],
            units: header_map[COL_UNITS],
            purchase_date: at(COL_PURCHASE_DATE),
            sale_date: at(COL_SALE_DATE),
            return_date: at(COL_RETURN_DATE),
        })
    }
}

/// Convert a sheet range (header row first) into records.
pub fn records_from_range(range: &Range<Data>) -> Result<(Vec<Record>, IngestStats), AppError> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| AppError::input("Sheet is empty (no header row)."))?;

    let header_map = build_header_map(header);
    let columns = Columns::resolve(&header_map)?;

    let mut stats = IngestStats::default();
    let mut records = Vec::new();

    for row in rows {
        stats.rows_read += 1;
        if row.iter().all(is_blank) {
            stats.blank_rows += 1;
            continue;
        }

        let amount = match parse_amount(cell(row, Some(columns.amount))) {
            Some(v) => v,
            None => {
                stats.amount_defaults += 1;
                Decimal::ZERO
            }
        };
        let units = match parse_units(cell(row, Some(columns.units))) {
            Some(v) => v,
            None => {
                stats.unit_defaults += 1;
                0
            }
        };

        let mut date_at = |idx: Option<usize>| {
            let c = cell(row, idx);
            let parsed = parse_date_cell(c);
            if parsed.is_none() && !is_blank(c) {
                stats.bad_dates += 1;
            }
            parsed
        };
        let purchase_date = date_at(columns.purchase_date);
        let sale_date = date_at(columns.sale_date);
        let return_date = date_at(columns.return_date);

        records.push(Record {
            agent: cell_text(cell(row, Some(columns.agent))),
            week: cell_text(cell(row, Some(columns.week))),
            manager: cell_text(cell(row, Some(columns.manager))),
            amount,
            units,
            purchase_date,
            sale_date,
            return_date,
        });
    }

    stats.rows_used = records.len();
    Ok((records, stats))
}

/// Header name to column index. A repeated header keeps its first column.
fn build_header_map(header: &[Data]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, c) in header.iter().enumerate() {
        map.entry(normalize_header_name(&cell_text(c))).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Exports sometimes carry a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_uppercase()
}

const EMPTY: Data = Data::Empty;

fn cell(row: &[Data], idx: Option<usize>) -> &Data {
    idx.and_then(|i| row.get(i)).unwrap_or(&EMPTY)
}

fn is_blank(c: &Data) -> bool {
    match c {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Render any cell as text, the way the grouping columns are compared.
fn cell_text(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Int(v) => v.to_string(),
        Data::Float(v) => {
            if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                format!("{}", *v as i64)
            } else {
                v.to_string()
            }
        }
        Data::Bool(v) => v.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => c
            .as_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| c.to_string()),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

fn parse_amount(c: &Data) -> Option<Decimal> {
    match c {
        Data::Int(v) => Some(Decimal::from(*v)),
        Data::Float(v) if v.is_finite() => Decimal::from_f64(*v),
        Data::String(s) => parse_decimal_text(s),
        _ => None,
    }
}

fn parse_decimal_text(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '$' | ' '))
        .collect();
    let cleaned = strip_thousands(&cleaned)?;
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

fn parse_units(c: &Data) -> Option<i64> {
    match c {
        Data::Int(v) => Some(*v),
        Data::Float(v) => float_to_units(*v),
        Data::String(s) => {
            let s = strip_thousands(s.trim())?;
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_units))
        }
        _ => None,
    }
}

/// Drop `,` thousands separators. Commas anywhere else (a decimal comma such
/// as `12,50`) make the text unparseable.
fn strip_thousands(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let int_part = unsigned.split('.').next().unwrap_or("");
    let mut groups = int_part.split(',');
    let head = groups.next().unwrap_or("");
    let digits = |g: &str| g.chars().all(|ch| ch.is_ascii_digit());
    let head_ok = (1..=3).contains(&head.len()) && digits(head);
    if !head_ok || !groups.all(|g| g.len() == 3 && digits(g)) {
        return None;
    }
    Some(s.replace(',', ""))
}

fn float_to_units(v: f64) -> Option<i64> {
    if v.is_finite() && v.abs() < i64::MAX as f64 {
        Some(v.round() as i64)
    } else {
        None
    }
}

fn parse_date_cell(c: &Data) -> Option<NaiveDate> {
    match c {
        Data::DateTime(_) | Data::DateTimeIso(_) => c.as_date(),
        Data::String(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // ISO is what the sheet usually holds, but hand-typed cells use
    // `DD/MM/YYYY`. A trailing time part is ignored.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    let date_part = s.split([' ', 'T']).next().unwrap_or("");
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), value);
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn full_header() -> Vec<Data> {
        vec![
            s("SEMANA"),
            s("AGENTE"),
            s("GESTOR"),
            s("COSTO_USD+"),
            s("CANTIDAD_REGISTROS"),
            s("FECHA_COMPRA"),
            s("FECHA_VENTA"),
            s("FECHA_RMA"),
        ]
    }

    #[test]
    fn parses_well_formed_rows() {
        let range = sheet(vec![
            full_header(),
            vec![
                Data::Float(12.0),
                s("ACME"),
                s("Ana"),
                Data::Float(150.25),
                Data::Int(3),
                s("2024-03-01"),
                s("05/03/2024"),
                Data::Empty,
            ],
        ]);

        let (records, stats) = records_from_range(&range).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.week, "12");
        assert_eq!(r.agent, "ACME");
        assert_eq!(r.manager, "Ana");
        assert_eq!(r.amount, dec("150.25"));
        assert_eq!(r.units, 3);
        assert_eq!(r.purchase_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(r.sale_date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(r.return_date, None);
        assert_eq!(stats.bad_dates, 0);
    }

    #[test]
    fn unparseable_numbers_default_to_zero() {
        let range = sheet(vec![
            full_header(),
            vec![s("W1"), s("ACME"), s("Ana"), s("n/a"), s("many")],
            vec![s("W1"), s("ACME"), s("Ana"), Data::Empty, Data::Empty],
            vec![s("W1"), s("ACME"), s("Ana"), s("$1,200.50"), s("2.0")],
        ]);

        let (records, stats) = records_from_range(&range).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].amount, Decimal::ZERO);
        assert_eq!(records[0].units, 0);
        assert_eq!(records[1].amount, Decimal::ZERO);
        assert_eq!(records[1].units, 0);
        assert_eq!(records[2].amount, dec("1200.50"));
        assert_eq!(records[2].units, 2);
        assert_eq!(stats.amount_defaults, 2);
        assert_eq!(stats.unit_defaults, 2);
    }

    #[test]
    fn decimal_commas_are_not_thousands_separators() {
        let range = sheet(vec![
            full_header(),
            vec![s("W1"), s("ACME"), s("Ana"), s("12,50"), s("2,5")],
            vec![s("W1"), s("ACME"), s("Ana"), s("-1,234,567.8"), s("1,000")],
            vec![s("W1"), s("ACME"), s("Ana"), s("1,23,456"), s(",500")],
        ]);

        let (records, stats) = records_from_range(&range).unwrap();
        assert_eq!(records[0].amount, Decimal::ZERO);
        assert_eq!(records[0].units, 0);
        assert_eq!(records[1].amount, dec("-1234567.8"));
        assert_eq!(records[1].units, 1000);
        assert_eq!(records[2].amount, Decimal::ZERO);
        assert_eq!(records[2].units, 0);
        assert_eq!(stats.amount_defaults, 2);
        assert_eq!(stats.unit_defaults, 2);
    }

    #[test]
    fn repeated_header_keeps_first_column() {
        let mut header = full_header();
        header.push(s("GESTOR"));
        let mut row = vec![s("W1"), s("ACME"), s("Ana"), Data::Int(5), Data::Int(1)];
        row.extend([Data::Empty, Data::Empty, Data::Empty, s("Bo")]);
        let range = sheet(vec![header, row]);

        let (records, _) = records_from_range(&range).unwrap();
        assert_eq!(records[0].manager, "Ana");
    }

    #[test]
    fn unparseable_dates_become_none() {
        let range = sheet(vec![
            full_header(),
            vec![
                s("W1"),
                s("ACME"),
                s("Ana"),
                Data::Float(1.0),
                Data::Int(1),
                s("not a date"),
                s("2024-13-45"),
                s("2024-02-10 00:00:00"),
            ],
        ]);

        let (records, stats) = records_from_range(&range).unwrap();
        assert_eq!(records[0].purchase_date, None);
        assert_eq!(records[0].sale_date, None);
        assert_eq!(records[0].return_date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(stats.bad_dates, 2);
    }

    #[test]
    fn optional_date_columns_may_be_missing() {
        let range = sheet(vec![
            vec![s("agente"), s(" Semana "), s("GESTOR"), s("COSTO_USD+"), s("CANTIDAD_REGISTROS")],
            vec![s("ACME"), s("W2"), s("Bo"), Data::Int(10), Data::Float(2.6)],
        ]);

        let (records, _) = records_from_range(&range).unwrap();
        assert_eq!(records[0].agent, "ACME");
        assert_eq!(records[0].week, "W2");
        assert_eq!(records[0].units, 3);
        assert_eq!(records[0].purchase_date, None);
    }

    #[test]
    fn missing_required_column_fails() {
        let range = sheet(vec![
            vec![s("SEMANA"), s("AGENTE"), s("GESTOR"), s("COSTO_USD+")],
            vec![s("W1"), s("ACME"), s("Ana"), Data::Int(1)],
        ]);

        let err = records_from_range(&range).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("CANTIDAD_REGISTROS"));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let range = sheet(vec![
            full_header(),
            vec![Data::Empty, s("  ")],
            vec![s("W1"), s("ACME"), s("Ana"), Data::Int(5), Data::Int(1)],
        ]);

        let (records, stats) = records_from_range(&range).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.blank_rows, 1);
    }

    #[test]
    fn missing_workbook_collapses_to_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceKey::new(PathBuf::from(dir.path()).join("missing.xlsx"), "Sheet1");
        assert!(try_load_dataset(&source).is_err());
        assert!(load_dataset(&source).is_empty());
    }

    #[test]
    fn unreadable_workbook_collapses_to_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();
        let source = SourceKey::new(path, "Sheet1");
        assert!(load_dataset(&source).is_empty());
    }
}
