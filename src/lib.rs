//! `rma-report` library crate.
//!
//! The binary (`rma`) is a thin wrapper around this library so that:
//!
//! - loading and comparison logic is testable without spawning processes
//! - the text report and the dashboard share one view pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod snapshot;
pub mod tui;
