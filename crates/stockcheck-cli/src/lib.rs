//! Stockcheck CLI library
//!
//! Command-line runner for the stockcheck scenario catalogue: list
//! scenarios, run them against Chromium or the simulated app, and show the
//! effective configuration.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, DriverArg, ListArgs, RunArgs, TagArg};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{RunResults, ScenarioResult, ScenarioRunner};
