//! Week-over-week comparison of two snapshots.
//!
//! The per-row variance compares each current row with the *summed* baseline
//! amount of its manager (a left join on manager, missing groups filled with
//! zero). There is no row-to-row matching between the two weeks.

use rust_decimal::Decimal;

use crate::domain::{ComparisonRow, GroupSummary, Record, ShareEntry, Summary, Totals, WeekPair};

/// Lower bound for the amount bar scale, so tiny datasets don't render
/// every bar at 100%.
pub const MIN_BAR_SCALE: Decimal = Decimal::ONE_HUNDRED;

/// Amount sum, unit sum and row count of one snapshot.
pub fn totals(snapshot: &[&Record]) -> Totals {
    snapshot.iter().fold(Totals::default(), |mut acc, r| {
        acc.amount += r.amount;
        acc.units += r.units;
        acc.rows += 1;
        acc
    })
}

/// Totals of both sides plus `current - baseline` deltas.
pub fn summarize(current: &[&Record], baseline: &[&Record], weeks: WeekPair) -> Summary {
    let current = totals(current);
    let baseline = totals(baseline);
    Summary {
        amount_delta: current.amount - baseline.amount,
        units_delta: current.units - baseline.units,
        current,
        baseline,
        weeks,
    }
}

/// Sum of amounts per manager.
pub fn group_summary(snapshot: &[&Record]) -> GroupSummary {
    let mut groups = GroupSummary::new();
    for r in snapshot {
        *groups.entry(r.manager.clone()).or_insert(Decimal::ZERO) += r.amount;
    }
    groups
}

/// One detail row per current record, sorted by amount (largest first).
///
/// Ties keep their snapshot order.
pub fn comparison_rows(current: &[&Record], baseline: &[&Record]) -> Vec<ComparisonRow> {
    let baseline_groups = group_summary(baseline);

    let mut rows: Vec<ComparisonRow> = current
        .iter()
        .map(|r| {
            let baseline_amount = baseline_groups
                .get(&r.manager)
                .copied()
                .unwrap_or(Decimal::ZERO);
            ComparisonRow {
                manager: r.manager.clone(),
                amount: r.amount,
                units: r.units,
                purchase_date: r.purchase_date,
                return_date: r.return_date,
                baseline_amount,
                variance: r.amount - baseline_amount,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    rows
}

/// Per-manager amount of the current snapshot, smallest first.
///
/// Feeds both the ranked bar chart and the share (donut) chart.
pub fn distribution(current: &[&Record]) -> Vec<ShareEntry> {
    let mut entries: Vec<ShareEntry> = group_summary(current)
        .into_iter()
        .map(|(manager, amount)| ShareEntry { manager, amount })
        .collect();
    entries.sort_by(|a, b| a.amount.cmp(&b.amount));
    entries
}

/// Upper bound of the amount bar column: the largest amount, at least 100.
pub fn bar_scale(rows: &[ComparisonRow]) -> Decimal {
    rows.iter()
        .map(|r| r.amount)
        .max()
        .unwrap_or(Decimal::ZERO)
        .max(MIN_BAR_SCALE)
}
