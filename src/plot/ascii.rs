//! ASCII/Unicode charts for the text report.
//!
//! This is intentionally "dumb" (fixed-width cells), optimized for:
//! - quick visual checks in a terminal or a pasted log
//! - deterministic output (helpful for golden tests)
//!
//! Chart elements:
//! - ranked bars: one `█` bar per manager, largest on top
//! - share list: percentage of the total per manager, with a `▒` bar

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::ShareEntry;
use crate::report::money;

const LABEL_WIDTH: usize = 16;

/// Number of filled cells for `value` on a `0..=max` scale of `width` cells.
pub fn bar_cells(value: Decimal, max: Decimal, width: usize) -> usize {
    if max <= Decimal::ZERO || value <= Decimal::ZERO {
        return 0;
    }
    let ratio = (value / max).to_f64().unwrap_or(0.0).clamp(0.0, 1.0);
    (ratio * width as f64).round() as usize
}

/// Horizontal ranked bar chart. `entries` come smallest first, as produced by
/// the distribution step; the largest bar is drawn on the first line.
pub fn render_ranked_bars(entries: &[ShareEntry], width: usize) -> String {
    let bar_width = width.saturating_sub(LABEL_WIDTH + 16).max(10);
    let max = entries
        .iter()
        .map(|e| e.amount)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut out = String::new();
    for e in entries.iter().rev() {
        let filled = bar_cells(e.amount, max, bar_width);
        out.push_str(
            format!(
                "{:<lw$} {:<bw$} {}",
                crate::report::format::truncate(&e.manager, LABEL_WIDTH),
                "█".repeat(filled),
                money::currency(e.amount),
                lw = LABEL_WIDTH,
                bw = bar_width
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Share of the total per manager, largest first.
pub fn render_share_list(entries: &[ShareEntry], width: usize) -> String {
    let bar_width = width.saturating_sub(LABEL_WIDTH + 10).max(10);
    let total: Decimal = entries.iter().map(|e| e.amount).sum();

    let mut out = String::new();
    for e in entries.iter().rev() {
        let pct = share_percent(e.amount, total);
        let filled = bar_cells(e.amount, total, bar_width);
        out.push_str(
            format!(
                "{:<lw$} {:>6.1}% {}",
                crate::report::format::truncate(&e.manager, LABEL_WIDTH),
                pct,
                "▒".repeat(filled),
                lw = LABEL_WIDTH
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Percentage of `total` that `value` represents (0 when the total is not positive).
pub fn share_percent(value: Decimal, total: Decimal) -> f64 {
    if total <= Decimal::ZERO {
        return 0.0;
    }
    (value / total * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}
