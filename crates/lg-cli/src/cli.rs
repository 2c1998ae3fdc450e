//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Lodging log charts and reports.
///
/// Reads logged hotel stays and home history, and reports on consecutive
/// nights spent traveling or at home.
#[derive(Debug, Parser)]
#[command(name = "lg", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Draw the nights away and home chart as SVG.
    Chart {
        /// Where to write the SVG file (relative paths resolve against `output_dir`).
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the statistics text file here.
        #[arg(long)]
        stats: Option<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// List the longest home and away periods.
    Stats {
        #[command(flatten)]
        range: RangeArgs,

        /// Show at most this many periods of each kind.
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List regions lived in or stayed in.
    Regions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Analysis range options.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct RangeArgs {
    /// First evening to include (YYYY-MM-DD). Defaults to the evening before
    /// the first logged night.
    #[arg(long)]
    pub start_evening: Option<NaiveDate>,

    /// Last morning to include (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub thru_morning: Option<NaiveDate>,
}
