use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::io_utils::DEFAULT_EXPORT_FILE;

pub const SOURCE_ENV: &str = "CSV_GLANCE_SOURCE";

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse, chart and re-export CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Display a CSV file as a filtered, sorted table
    View(ViewArgs),
    /// Summarize numeric columns as a bar chart
    Chart(ChartArgs),
    /// Write the filtered, sorted rows back out as CSV
    Export(ExportArgs),
    /// Interactive session reading commands from stdin
    Explore(ExploreArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// CSV file path or http(s) URL (defaults to $CSV_GLANCE_SOURCE)
    #[arg(short = 'i', long = "input", env = SOURCE_ENV)]
    pub input: Option<String>,
    /// Character encoding of the input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ViewOptions {
    /// Case-insensitive text that must appear in at least one column
    #[arg(short = 'f', long = "filter", default_value = "")]
    pub filter: String,
    /// Sort column; repeating the same column flips the direction
    #[arg(short = 's', long = "sort", action = clap::ArgAction::Append)]
    pub sort: Vec<String>,
    /// Sort the final column descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewOptions,
    /// Maximum number of rows to display
    #[arg(long)]
    pub rows: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Emit the chart series as JSON instead of text bars
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewOptions,
    /// Output CSV file (`-` for stdout)
    #[arg(short = 'o', long = "output", default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
