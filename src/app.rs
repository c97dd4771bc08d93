//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - loads the workbook through the process-wide cache
//! - resolves the requested selection and renders or exports it

use chrono::Local;
use clap::Parser;
use tracing::{debug, info, warn};

use crate::cli::{Command, ExportArgs, ReportArgs, SelectArgs};
use crate::config::SourceConfig;
use crate::domain::Dataset;
use crate::error::AppError;
use crate::io::DatasetCache;
use crate::logging::{init_logger, LogTarget};
use crate::snapshot;

pub mod view;

use view::{render_view, View, ViewModel, ViewState, LOAD_FAILED_MESSAGE, NO_WEEKS_MESSAGE};

/// Entry point for the `rma` binary.
pub fn run() -> Result<(), AppError> {
    let dotenv = crate::config::load_dotenv();

    // We want `rma` and `rma -a ACME` to behave like `rma tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let select = cli.command.select();
    let target = match (&cli.command, select.log_file.as_deref()) {
        (_, Some(path)) => LogTarget::File(path),
        (Command::Tui(_), None) => LogTarget::Off,
        (_, None) => LogTarget::Stderr,
    };
    init_logger(select.log_level, target)?;
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Report(args) => handle_report(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_tui(args: SelectArgs) -> Result<(), AppError> {
    let source = SourceConfig::from_args(&args.source).key();
    let cache = DatasetCache::global();
    let dataset = cache.get_or_load(&source);

    let state = dashboard_state(&dataset, &args);
    crate::tui::run(source, cache, state)
}

/// CLI selections only seed the dashboard; an invalid one is logged and the
/// dashboard falls back to its defaults.
fn dashboard_state(dataset: &Dataset, args: &SelectArgs) -> Option<ViewState> {
    match resolve_state(dataset, args) {
        Ok(state) => Some(state),
        Err(err) => {
            warn!("ignoring dashboard selection: {err}");
            None
        }
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let model = compute(&args.select)?;
    let today = Local::now().date_naive();
    println!(
        "{}",
        crate::report::format_report(&model, today, args.width)
    );
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let model = compute(&args.select)?;
    let Some(detail) = &model.detail else {
        return Err(AppError::no_data(view::EMPTY_SELECTION_MESSAGE));
    };
    crate::io::write_detail_csv(&args.output, &detail.rows)?;
    println!(
        "Wrote {} row(s) to {}",
        detail.rows.len(),
        args.output.display()
    );
    Ok(())
}

/// Load the source, resolve the selection and render it, turning the blocking
/// states into errors.
fn compute(args: &SelectArgs) -> Result<ViewModel, AppError> {
    let source = SourceConfig::from_args(&args.source).key();
    let dataset = DatasetCache::global().get_or_load(&source);
    if dataset.is_empty() {
        return Err(AppError::input(format!(
            "{LOAD_FAILED_MESSAGE} ({source})"
        )));
    }

    let state = resolve_state(&dataset, args)?;
    info!(
        agent = %state.agent,
        current = %state.current_week,
        baseline = %state.baseline_week,
        "computing comparison"
    );

    match render_view(&state, &dataset) {
        View::Ready(model) => Ok(model),
        View::LoadFailed => Err(AppError::input(LOAD_FAILED_MESSAGE)),
        View::NoWeeks { agent } => Err(AppError::no_data(format!("{NO_WEEKS_MESSAGE} ({agent})"))),
    }
}

/// Turn CLI selections into a `ViewState`, validating every value against
/// what the dataset actually contains.
pub fn resolve_state(dataset: &Dataset, args: &SelectArgs) -> Result<ViewState, AppError> {
    let agents = snapshot::agents(dataset);
    let agent = match &args.agent {
        Some(agent) => {
            ensure_known("agent", agent, &agents)?;
            agent.clone()
        }
        None => agents
            .first()
            .cloned()
            .ok_or_else(|| AppError::input(LOAD_FAILED_MESSAGE))?,
    };

    let mut state = ViewState::for_agent(dataset, agent);
    let weeks = snapshot::weeks(dataset, &state.agent);
    if weeks.is_empty() {
        return Err(AppError::no_data(format!("{NO_WEEKS_MESSAGE} ({})", state.agent)));
    }

    if let Some(week) = &args.current {
        ensure_known("week", week, &weeks)?;
        state = state.with_current_week(week.clone());
    }
    if let Some(week) = &args.baseline {
        ensure_known("week", week, &weeks)?;
        state = state.with_baseline_week(week.clone());
    }

    if !args.managers.is_empty() {
        let managers = snapshot::managers(dataset, &state.agent);
        for manager in &args.managers {
            ensure_known("manager", manager, &managers)?;
        }
        state = state.with_managers(args.managers.clone());
    }

    Ok(state)
}

fn ensure_known(what: &str, value: &str, known: &[String]) -> Result<(), AppError> {
    if known.iter().any(|k| k == value) {
        return Ok(());
    }
    Err(AppError::input(format!(
        "Unknown {what} '{value}'. Available: {}",
        known.join(", ")
    )))
}

/// Rewrite argv so `rma` defaults to `rma tui`.
///
/// Rules:
/// - `rma`                      -> `rma tui`
/// - `rma -a ACME ...`          -> `rma tui -a ACME ...`
/// - `rma --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "report" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
