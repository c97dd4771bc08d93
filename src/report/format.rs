//! Plain-text rendering of a computed view.
//!
//! We keep formatting code in one place so:
//! - the comparison code stays clean and testable
//! - output changes are localized

use chrono::NaiveDate;

use crate::app::view::{Detail, ViewModel, EMPTY_SELECTION_MESSAGE};
use crate::domain::{ComparisonRow, Summary};
use crate::report::money;

/// Title block: report name and the date it was produced.
pub fn format_header(today: NaiveDate) -> String {
    format!(
        "=== RMA Control ===\nWeekly comparison • {}\n",
        today.format("%d/%m/%Y")
    )
}

/// Active selection line (agent, weeks, manager filter).
pub fn format_selection(model: &ViewModel) -> String {
    let managers = if model.state.managers.is_empty() {
        "all".to_string()
    } else {
        model.state.managers.join(", ")
    };
    format!("Agent: {} | Managers: {managers}\n", model.state.agent)
}

/// The four summary indicators, one per line.
pub fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();
    for (label, value, delta) in summary_cards(summary) {
        match delta {
            Some(delta) => out.push_str(&format!("{label:<16} {value:>16}  ({delta})\n")),
            None => out.push_str(&format!("{label:<16} {value:>16}\n")),
        }
    }
    out
}

/// `(label, value, delta)` for the four indicators, shared with the TUI cards.
pub fn summary_cards(summary: &Summary) -> [(&'static str, String, Option<String>); 4] {
    [
        (
            "Pending amount",
            money::currency(summary.current.amount),
            Some(money::signed_amount(summary.amount_delta)),
        ),
        (
            "Units",
            summary.current.units.to_string(),
            Some(money::signed_int(summary.units_delta)),
        ),
        (
            "Comparison",
            format!("{} → {}", summary.weeks.baseline, summary.weeks.current),
            None,
        ),
        ("Records", summary.current.rows.to_string(), None),
    ]
}

/// The comparative detail table with a text amount bar.
pub fn format_detail_table(detail: &Detail, bar_width: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:>14} {:<w$} {:>6} {:>14} {:<10} {:<10}",
            "manager",
            "amount",
            "",
            "units",
            "var $",
            "purchased",
            "rma",
            w = bar_width
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<14} {:-<w$} {:-<6} {:-<14} {:-<10} {:-<10}",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            w = bar_width
        )
        .trim_end(),
    );
    out.push('\n');

    for row in &detail.rows {
        out.push_str(&format_row(row, detail, bar_width));
        out.push('\n');
    }
    out
}

fn format_row(row: &ComparisonRow, detail: &Detail, bar_width: usize) -> String {
    let filled = crate::plot::bar_cells(row.amount, detail.bar_max, bar_width);
    format!(
        "{:<20} {:>14} {:<w$} {:>6} {:>14} {:<10} {:<10}",
        truncate(&row.manager, 20),
        money::currency(row.amount),
        "█".repeat(filled),
        row.units,
        money::signed_currency(row.variance),
        money::date(row.purchase_date),
        money::date(row.return_date),
        w = bar_width
    )
    .trim_end()
    .to_string()
}

/// Full report: header, selection, indicators, table and charts.
pub fn format_report(model: &ViewModel, today: NaiveDate, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format_header(today));
    out.push_str(&format_selection(model));
    out.push('\n');
    out.push_str(&format_summary(&model.summary));
    out.push('\n');

    match &model.detail {
        Some(detail) => {
            out.push_str("Comparative detail:\n");
            out.push_str(&format_detail_table(detail, 12));
            out.push('\n');
            out.push_str("Amount by manager:\n");
            out.push_str(&crate::plot::render_ranked_bars(&detail.distribution, width));
            out.push('\n');
            out.push_str("Share by manager:\n");
            out.push_str(&crate::plot::render_share_list(&detail.distribution, width));
        }
        None => {
            out.push_str(EMPTY_SELECTION_MESSAGE);
            out.push('\n');
        }
    }
    out
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::view::{render_view, View, ViewState};
    use crate::domain::{Dataset, Record};
    use rust_decimal::Decimal;

    fn rec(week: &str, manager: &str, amount: i64) -> Record {
        Record {
            agent: "ACME".to_string(),
            week: week.to_string(),
            manager: manager.to_string(),
            amount: Decimal::from(amount),
            units: 1,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            sale_date: None,
            return_date: None,
        }
    }

    fn model(current_week: &str) -> ViewModel {
        let ds = Dataset::new(vec![rec("W1", "A", 80), rec("W2", "A", 100), rec("W2", "B", 50)]);
        let state = ViewState::initial(&ds).unwrap().with_current_week(current_week);
        match render_view(&state, &ds) {
            View::Ready(m) => m,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn summary_lists_four_indicators() {
        let text = format_summary(&model("W2").summary);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("$150.00") && lines[0].contains("(+70.00)"));
        assert!(lines[1].contains("(+1)"));
        assert!(lines[2].contains("W1 → W2"));
        assert!(lines[3].ends_with('2'));
    }

    #[test]
    fn table_rows_are_sorted_and_signed() {
        let m = model("W2");
        let table = format_detail_table(m.detail.as_ref().unwrap(), 10);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("A "));
        assert!(lines[2].contains("+$20.00"));
        assert!(lines[2].contains("15/01/2024"));
        assert!(lines[3].contains("+$50.00"));
    }

    #[test]
    fn report_shows_message_for_empty_selection() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let text = format_report(&model("W7"), today, 40);
        assert!(text.contains("01/02/2024"));
        assert!(text.contains(EMPTY_SELECTION_MESSAGE));
        assert!(!text.contains("Comparative detail"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long manager", 6), "a ver.");
    }
}
