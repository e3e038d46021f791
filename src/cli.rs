//! CLI interface for tariffscope
//!
//! This module defines the command-line interface using clap:
//! `tariffscope [--json] [--verbose] <command>`.
//!
//! # Example
//!
//! ```bash
//! # Rank the catalog against one meter export
//! tariffscope analyze meter_23278570_LP.csv --plans electrical_plans.csv
//!
//! # Several exports at once, with a ranking CSV and the hourly profile
//! tariffscope analyze exports/ --export ranking.csv --profile
//!
//! # Clean an export into the canonical timestamp,kwh_consumption layout
//! tariffscope normalize meter.csv --output clean.csv
//!
//! # Which months are complete enough to be billed?
//! tariffscope months meter.csv --threshold 0.8
//! ```

use crate::config::Settings;
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tariffscope_core::series::DEFAULT_COMPLETENESS_THRESHOLD;
use tariffscope_pricing::catalog::DEFAULT_BASE_RATE;

/// Rank time-of-use electricity plans against 15-minute meter exports
#[derive(Parser, Debug, Clone)]
#[command(name = "tariffscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Month completeness threshold shared by every command
#[derive(Args, Debug, Clone)]
pub struct ThresholdArgs {
    /// Share of a month's 15-minute intervals required to bill it, in (0, 1]
    #[arg(long, env = "TARIFFSCOPE_THRESHOLD", default_value_t = DEFAULT_COMPLETENESS_THRESHOLD)]
    pub threshold: f64,
}

/// Where the plan catalog comes from
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Plan catalog CSV (default: ./electrical_plans.csv, then the config directory)
    #[arg(long, env = "TARIFFSCOPE_PLANS")]
    pub plans: Option<PathBuf>,

    /// Base rate per kWh for catalog rows without one
    #[arg(long, env = "TARIFFSCOPE_DEFAULT_RATE", default_value_t = DEFAULT_BASE_RATE)]
    pub default_rate: f64,
}

/// Arguments for the analyze command
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Meter export files or directories of exports
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(flatten)]
    pub threshold: ThresholdArgs,

    /// Also write the ranking as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Show the hourly consumption profile of the latest active months
    #[arg(long)]
    pub profile: bool,

    /// Show only the best N plans
    #[arg(long)]
    pub top: Option<usize>,
}

/// Arguments for the normalize command
#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// Meter export file
    pub file: PathBuf,

    /// Write the canonical CSV here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub threshold: ThresholdArgs,
}

/// Arguments for the months command
#[derive(Args, Debug, Clone)]
pub struct MonthsArgs {
    /// Meter export file
    pub file: PathBuf,

    #[command(flatten)]
    pub threshold: ThresholdArgs,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rank the plan catalog against meter exports
    Analyze(AnalyzeArgs),

    /// Convert a meter export into canonical timestamp,kwh_consumption CSV
    Normalize(NormalizeArgs),

    /// Show month completeness for a meter export
    Months(MonthsArgs),
}

impl AnalyzeArgs {
    pub fn settings(&self) -> Result<Settings> {
        Settings::new(
            self.catalog.plans.clone(),
            self.threshold.threshold,
            self.catalog.default_rate,
        )
    }
}

impl ThresholdArgs {
    pub fn settings(&self) -> Result<Settings> {
        Settings::new(None, self.threshold, DEFAULT_BASE_RATE)
    }
}
