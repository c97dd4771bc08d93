//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// Drop everything (the dashboard owns the terminal).
    Off,
}

/// Filter for the library crate and the `rma` binary target at `level`.
fn default_directives(level: LevelFilter) -> String {
    format!("{}={level},{BIN_TARGET}={level}", env!("CARGO_CRATE_NAME"))
}

/// Target of events emitted from `src/main.rs`.
const BIN_TARGET: &str = "rma";

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to this crate only.
pub fn init_logger(level: LevelFilter, target: LogTarget<'_>) -> Result<(), AppError> {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(default_directives(level)),
    };

    let (writer, ansi) = match target {
        LogTarget::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::input(format!("Failed to open log file '{}': {e}", path.display()))
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        LogTarget::Off => (BoxMakeWriter::new(std::io::sink), false),
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_library_and_binary() {
        assert_eq!(default_directives(LevelFilter::DEBUG), "rma_report=debug,rma=debug");
        assert!(EnvFilter::try_new(default_directives(LevelFilter::INFO)).is_ok());
    }
}
