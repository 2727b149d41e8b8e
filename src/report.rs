//! Whole-file analysis: the upload summary and the chart refresh.

use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    charts::{ChartSpec, derive_charts},
    config::AnalysisConfig,
    ingest::{Result, SourceFormat, ingest},
    schema::{ColumnTypeMap, infer_types},
    stats::{ColumnStats, compute_stats},
};

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub filename: String,
    pub total_rows: usize,
    pub columns: Vec<String>,
    /// The first `preview_rows` rows.
    pub data: Vec<Map<String, JsonValue>>,
    pub data_types: ColumnTypeMap,
    pub charts: Vec<ChartSpec>,
    pub stats: Vec<ColumnStats>,
}

pub fn analyze(
    path: &Path,
    config: &AnalysisConfig,
    selected_category: Option<&str>,
) -> Result<AnalysisReport> {
    let format = SourceFormat::from_path(path)?;
    let table = ingest(path, format, config)?;
    let data_types = infer_types(&table, config);
    let stats = compute_stats(&table, &data_types, config);
    let charts = derive_charts(&table, &data_types, selected_category, config);

    let report = AnalysisReport {
        filename: file_name(path),
        total_rows: table.row_count(),
        columns: table.columns().to_vec(),
        data: table.records(0, config.preview_rows),
        data_types,
        charts,
        stats,
    };
    info!(
        "Analyzed {:?}: {} row(s), {} column(s), {} chart(s)",
        path,
        report.total_rows,
        report.columns.len(),
        report.charts.len()
    );
    Ok(report)
}

/// Re-derives only the charts, e.g. after the caller picks another category.
pub fn refresh_charts(
    path: &Path,
    config: &AnalysisConfig,
    selected_category: Option<&str>,
) -> Result<Vec<ChartSpec>> {
    let format = SourceFormat::from_path(path)?;
    let table = ingest(path, format, config)?;
    let types = infer_types(&table, config);
    Ok(derive_charts(&table, &types, selected_category, config))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
