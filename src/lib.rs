//! `covid-dash` library crate.
//!
//! The binary (`covid`) is a thin wrapper around this library so that:
//!
//! - the aggregation engine is testable without spawning processes
//! - the TUI and the text reports share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod plot;
pub mod present;
pub mod report;
pub mod tui;
