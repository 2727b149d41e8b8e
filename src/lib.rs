pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod delimited;
pub mod error;
pub mod frequency;
pub mod ingest;
pub mod io_utils;
pub mod pdf;
pub mod preview;
pub mod report;
pub mod rows;
pub mod schema;
pub mod spreadsheet;
pub mod stats;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands},
    config::AnalysisConfig,
};

pub use crate::{
    charts::{ChartSpec, derive_charts},
    error::IngestError,
    ingest::{SourceFormat, ingest, ingest_path},
    rows::{RowWindow, paginate},
    schema::{ColumnKind, ColumnTypeMap, infer_types},
    stats::{ColumnStats, compute_stats},
    table::UniformTable,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_insight", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze(args) => {
            let report = report::analyze(&args.input, &config, args.category.as_deref())?;
            print_json(&report)
        }
        Commands::Types(args) => {
            let table = ingest_path(&args.input, &config)?;
            print_json(&infer_types(&table, &config))
        }
        Commands::Stats(args) => handle_stats(&args.input, &config),
        Commands::Charts(args) => {
            let charts = report::refresh_charts(&args.input, &config, args.category.as_deref())?;
            print_json(&charts)
        }
        Commands::Page(args) => {
            let format = SourceFormat::from_path(&args.input)?;
            let window = paginate(&args.input, format, args.offset, args.limit, &config)?;
            print_json(&window)
        }
        Commands::Preview(args) => preview::execute(&args, &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let config = AnalysisConfig::load(path)
                .with_context(|| format!("Loading configuration from {path:?}"))?;
            debug!("Loaded configuration from {path:?}");
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn handle_stats(input: &Path, config: &AnalysisConfig) -> Result<()> {
    let table = ingest_path(input, config)?;
    let types = infer_types(&table, config);
    let stats = compute_stats(&table, &types, config);
    preview::print_table(&stats::render_headers(), &stats::render_rows(&stats));
    info!(
        "Summarized {} column(s) across {} row(s) from {:?}",
        stats.len(),
        table.row_count(),
        input
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing output as JSON")?;
    println!("{rendered}");
    Ok(())
}
