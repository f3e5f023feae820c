//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use stockcheck::Tag;

/// Stockcheck: end-to-end scenarios for the inventory and checkout app
#[derive(Parser, Debug)]
#[command(name = "stockcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Suite configuration file (YAML)
    #[arg(long, global = true, env = "STOCKCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List scenarios in the catalogue
    List(ListArgs),

    /// Run scenarios
    Run(RunArgs),

    /// Show the effective suite configuration, secrets masked
    Config(ConfigArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only scenarios carrying this tag
    #[arg(short, long, value_enum)]
    pub tag: Option<TagArg>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only scenarios carrying this tag
    #[arg(short, long, value_enum)]
    pub tag: Option<TagArg>,

    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Browser back-end
    #[arg(long, value_enum, default_value_t = DriverArg::default())]
    pub driver: DriverArg,

    /// Directory for failure screenshots
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Print the results as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Fail unless the configuration is complete for a live run
    #[arg(long)]
    pub check: bool,
}

/// Scenario tag argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagArg {
    /// Quick confidence checks
    Smoke,
    /// Full behavioural coverage
    Regression,
    /// Scenarios that change shared data
    Serial,
}

impl From<TagArg> for Tag {
    fn from(arg: TagArg) -> Self {
        match arg {
            TagArg::Smoke => Self::Smoke,
            TagArg::Regression => Self::Regression,
            TagArg::Serial => Self::Serial,
        }
    }
}

/// Browser back-end argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverArg {
    /// Real Chromium against the configured URL
    Chromium,
    /// In-memory simulation of the app
    Simulated,
}

impl Default for DriverArg {
    fn default() -> Self {
        if cfg!(feature = "browser") {
            Self::Chromium
        } else {
            Self::Simulated
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
