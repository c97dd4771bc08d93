//! Shared view pipeline used by both the text report and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! selection -> snapshots -> totals -> comparison rows -> chart distribution
//!
//! Front-ends hold a `ViewState`, call `render_view` after every change and
//! only draw the resulting `View`.

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{ComparisonRow, Dataset, ShareEntry, Summary, WeekPair};
use crate::report::compare;
use crate::snapshot;

/// Everything the user selected. Transitions return a new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub agent: String,
    pub current_week: String,
    pub baseline_week: String,
    /// Empty means "all managers".
    pub managers: Vec<String>,
}

impl ViewState {
    /// First agent with its default week pair. `None` for an empty dataset.
    pub fn initial(dataset: &Dataset) -> Option<Self> {
        let agent = snapshot::agents(dataset).into_iter().next()?;
        Some(Self::for_agent(dataset, agent))
    }

    /// Default selections for `agent`. Weeks stay empty when it has none.
    pub fn for_agent(dataset: &Dataset, agent: impl Into<String>) -> Self {
        let agent = agent.into();
        let weeks = snapshot::weeks(dataset, &agent);
        let pair = snapshot::default_weeks(&weeks).unwrap_or(WeekPair {
            current: String::new(),
            baseline: String::new(),
        });
        Self {
            agent,
            current_week: pair.current,
            baseline_week: pair.baseline,
            managers: Vec::new(),
        }
    }

    /// Switch agent. Weeks reset to that agent's defaults, the manager filter clears.
    pub fn with_agent(&self, dataset: &Dataset, agent: &str) -> Self {
        if agent == self.agent {
            return self.clone();
        }
        Self::for_agent(dataset, agent)
    }

    pub fn with_current_week(&self, week: impl Into<String>) -> Self {
        Self {
            current_week: week.into(),
            ..self.clone()
        }
    }

    pub fn with_baseline_week(&self, week: impl Into<String>) -> Self {
        Self {
            baseline_week: week.into(),
            ..self.clone()
        }
    }

    pub fn with_managers(&self, managers: Vec<String>) -> Self {
        let mut managers = managers;
        managers.sort();
        managers.dedup();
        Self {
            managers,
            ..self.clone()
        }
    }

    /// Add `manager` to the filter, or remove it if already present.
    pub fn toggle_manager(&self, manager: &str) -> Self {
        let mut managers = self.managers.clone();
        if let Some(pos) = managers.iter().position(|m| m == manager) {
            managers.remove(pos);
        } else {
            managers.push(manager.to_string());
        }
        self.with_managers(managers)
    }

    pub fn clear_managers(&self) -> Self {
        self.with_managers(Vec::new())
    }

    pub fn weeks(&self) -> WeekPair {
        WeekPair {
            current: self.current_week.clone(),
            baseline: self.baseline_week.clone(),
        }
    }
}

/// Table and chart data. Only exists when the current snapshot has rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub rows: Vec<ComparisonRow>,
    pub distribution: Vec<ShareEntry>,
    /// Full scale of the amount bar column.
    pub bar_max: Decimal,
}

/// Fully computed page for one `ViewState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub state: ViewState,
    pub agents: Vec<String>,
    pub weeks: Vec<String>,
    pub managers: Vec<String>,
    pub summary: Summary,
    /// `None` when nothing matches the current selection.
    pub detail: Option<Detail>,
}

/// Result of rendering: a page, or the state that stops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The workbook could not be loaded (blocking).
    LoadFailed,
    /// The agent has no weeks at all (blocking).
    NoWeeks { agent: String },
    Ready(ViewModel),
}

pub const LOAD_FAILED_MESSAGE: &str = "The data could not be loaded.";
pub const NO_WEEKS_MESSAGE: &str = "This agent has no data.";
pub const EMPTY_SELECTION_MESSAGE: &str = "No data for this selection.";

/// Compute the page for `state`. Pure: no I/O, no caching.
pub fn render_view(state: &ViewState, dataset: &Dataset) -> View {
    if dataset.is_empty() {
        return View::LoadFailed;
    }

    let weeks = snapshot::weeks(dataset, &state.agent);
    if weeks.is_empty() {
        return View::NoWeeks {
            agent: state.agent.clone(),
        };
    }

    let current = snapshot::snapshot(dataset, &state.agent, &state.current_week, &state.managers);
    let baseline = snapshot::snapshot(dataset, &state.agent, &state.baseline_week, &state.managers);
    debug!(
        agent = %state.agent,
        current = current.len(),
        baseline = baseline.len(),
        "rendering view"
    );

    let summary = compare::summarize(&current, &baseline, state.weeks());

    let detail = if current.is_empty() {
        None
    } else {
        let rows = compare::comparison_rows(&current, &baseline);
        let bar_max = compare::bar_scale(&rows);
        Some(Detail {
            distribution: compare::distribution(&current),
            rows,
            bar_max,
        })
    };

    View::Ready(ViewModel {
        state: state.clone(),
        agents: snapshot::agents(dataset),
        weeks,
        managers: snapshot::managers(dataset, &state.agent),
        summary,
        detail,
    })
}
