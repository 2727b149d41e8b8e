use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_PREVIEW_ROWS;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Inspect CSV, spreadsheet and PDF tables: column types, statistics and chart data",
    long_about = None
)]
pub struct Cli {
    /// YAML file overriding the default analysis settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the full analysis report (types, statistics, charts, preview rows) as JSON
    Analyze(AnalyzeArgs),
    /// Print the inferred kind of every column as JSON
    Types(InputArgs),
    /// Print per-column statistics as a table
    Stats(InputArgs),
    /// Print the derived chart data as JSON
    Charts(ChartsArgs),
    /// Print one window of rows as JSON
    Page(PageArgs),
    /// Preview the first rows in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file (.csv, .xlsx, .xls or .pdf)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input file (.csv, .xlsx, .xls or .pdf)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Categorical column to use for the bar chart
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct ChartsArgs {
    /// Input file (.csv, .xlsx, .xls or .pdf)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Categorical column to use for the bar chart
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Input file (.csv, .xlsx, .xls or .pdf)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Zero-based index of the first row to return
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Maximum number of rows to return
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file (.csv, .xlsx, .xls or .pdf)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}
