//! Snapshot selection: which agents, weeks and managers exist, and the
//! filtered row sets the comparison runs on.

use std::collections::BTreeSet;

use crate::domain::{Dataset, Record, WeekPair};

/// Distinct agents, sorted ascending.
pub fn agents(dataset: &Dataset) -> Vec<String> {
    distinct(dataset.records().iter().map(|r| r.agent.as_str()))
}

/// Distinct weeks recorded for `agent`, sorted ascending (lexical order).
pub fn weeks(dataset: &Dataset, agent: &str) -> Vec<String> {
    distinct(for_agent(dataset, agent).map(|r| r.week.as_str()))
}

/// Distinct managers recorded for `agent`, sorted ascending.
pub fn managers(dataset: &Dataset, agent: &str) -> Vec<String> {
    distinct(for_agent(dataset, agent).map(|r| r.manager.as_str()))
}

/// Default comparison: the latest week against the one before it.
///
/// With a single week both sides point at it. Returns `None` when `weeks` is
/// empty; callers must stop there instead of comparing.
pub fn default_weeks(weeks: &[String]) -> Option<WeekPair> {
    let current_idx = weeks.len().checked_sub(1)?;
    let baseline_idx = current_idx.saturating_sub(1);
    Some(WeekPair {
        current: weeks[current_idx].clone(),
        baseline: weeks[baseline_idx].clone(),
    })
}

/// Rows of one agent and week, optionally restricted to `managers`.
///
/// An empty manager list means no manager filtering.
pub fn snapshot<'a>(
    dataset: &'a Dataset,
    agent: &str,
    week: &str,
    managers: &[String],
) -> Vec<&'a Record> {
    dataset
        .records()
        .iter()
        .filter(|r| r.agent == agent && r.week == week)
        .filter(|r| managers.is_empty() || managers.iter().any(|m| *m == r.manager))
        .collect()
}

fn for_agent<'a>(dataset: &'a Dataset, agent: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
    dataset.records().iter().filter(move |r| r.agent == agent)
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn rec(agent: &str, week: &str, manager: &str, amount: i64) -> Record {
        Record {
            agent: agent.to_string(),
            week: week.to_string(),
            manager: manager.to_string(),
            amount: Decimal::from(amount),
            units: 1,
            purchase_date: None,
            sale_date: None,
            return_date: None,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            rec("ACME", "2024-W10", "Bo", 10),
            rec("ACME", "2024-W09", "Ana", 20),
            rec("Zeta", "2024-W11", "Cy", 30),
            rec("ACME", "2024-W10", "Ana", 40),
            rec("ACME", "2024-W08", "Bo", 50),
        ])
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lists_are_distinct_and_sorted() {
        let ds = dataset();
        assert_eq!(agents(&ds), strings(&["ACME", "Zeta"]));
        assert_eq!(weeks(&ds, "ACME"), strings(&["2024-W08", "2024-W09", "2024-W10"]));
        assert_eq!(managers(&ds, "ACME"), strings(&["Ana", "Bo"]));
        assert!(weeks(&ds, "nobody").is_empty());
    }

    #[test]
    fn weeks_sort_lexically() {
        let ds = Dataset::new(vec![rec("A", "10", "m", 1), rec("A", "9", "m", 1), rec("A", "2", "m", 1)]);
        assert_eq!(weeks(&ds, "A"), strings(&["10", "2", "9"]));
    }

    #[test]
    fn default_weeks_pick_last_two() {
        let w = strings(&["W1", "W2", "W3"]);
        let pair = default_weeks(&w).unwrap();
        assert_eq!(pair.current, "W3");
        assert_eq!(pair.baseline, "W2");
    }

    #[test]
    fn default_weeks_clamp_single_week() {
        let pair = default_weeks(&strings(&["W1"])).unwrap();
        assert_eq!(pair.current, "W1");
        assert_eq!(pair.baseline, "W1");
        assert!(default_weeks(&[]).is_none());
    }

    #[test]
    fn snapshot_filters_by_agent_week_and_managers() {
        let ds = dataset();
        let all = snapshot(&ds, "ACME", "2024-W10", &[]);
        assert_eq!(all.len(), 2);

        let only_ana = snapshot(&ds, "ACME", "2024-W10", &strings(&["Ana"]));
        assert_eq!(only_ana.len(), 1);
        assert_eq!(only_ana[0].amount, Decimal::from(40));

        assert!(snapshot(&ds, "ACME", "2024-W11", &[]).is_empty());
        assert!(snapshot(&ds, "ACME", "2024-W10", &strings(&["Cy"])).is_empty());
    }
}
