//! Command-line parsing for the RMA comparison dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! loading, comparison and rendering code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use crate::domain::{DEFAULT_SHEET, DEFAULT_WORKBOOK};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rma", version, about = "Weekly RMA comparison dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(SelectArgs),
    /// Print the summary, the comparative detail table and text charts.
    Report(ReportArgs),
    /// Write the comparative detail table to a CSV file.
    Export(ExportArgs),
}

impl Command {
    pub fn select(&self) -> &SelectArgs {
        match self {
            Command::Tui(args) => args,
            Command::Report(args) => &args.select,
            Command::Export(args) => &args.select,
        }
    }
}

/// Where the data comes from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Workbook to read.
    #[arg(short = 'f', long = "file", env = "RMA_WORKBOOK", default_value = DEFAULT_WORKBOOK)]
    pub file: PathBuf,

    /// Sheet holding the weekly movements.
    #[arg(long, env = "RMA_SHEET", default_value = DEFAULT_SHEET)]
    pub sheet: String,
}

/// Source, selection and logging options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct SelectArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Agent to report on (default: the first one, alphabetically).
    #[arg(short = 'a', long)]
    pub agent: Option<String>,

    /// Current week (default: the agent's latest week).
    #[arg(long)]
    pub current: Option<String>,

    /// Week to compare against (default: the week before the latest).
    #[arg(long)]
    pub baseline: Option<String>,

    /// Restrict to these managers. Repeat the flag for several; none means all.
    #[arg(short = 'm', long = "manager")]
    pub managers: Vec<String>,

    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,

    /// Write logs to this file. The dashboard only logs when this is set.
    #[arg(long, env = "RMA_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Options for the text report.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,
}

/// Options for the CSV export.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_managers() {
        let cli = Cli::parse_from([
            "rma", "report", "-f", "book.xlsx", "-a", "ACME", "-m", "Ana", "-m", "Bo", "--current", "W2",
        ]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.select.source.file, PathBuf::from("book.xlsx"));
        assert_eq!(args.select.agent.as_deref(), Some("ACME"));
        assert_eq!(args.select.managers, vec!["Ana".to_string(), "Bo".to_string()]);
        assert_eq!(args.select.current.as_deref(), Some("W2"));
        assert_eq!(args.width, 80);
    }
}
