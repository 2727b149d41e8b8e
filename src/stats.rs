//! Per-column summary statistics.
//!
//! The shape of each record follows the column's inferred kind. Numeric and
//! datetime aggregates use the full column, not the inference sample, so a
//! value past the sample that does not parse turns that column's record into
//! [`ColumnStats::Error`] while every other column is computed normally.

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    data::{detect_date_format, format_number},
    frequency::ValueCounts,
    schema::{ColumnKind, ColumnTypeMap},
    table::UniformTable,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnStats {
    Numeric(NumericStats),
    Datetime(DatetimeStats),
    Categorical(DistributionStats),
    Text(DistributionStats),
    Empty(DistributionStats),
    Error(ErrorStats),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub column: String,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatetimeStats {
    pub column: String,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    pub column: String,
    pub unique_count: usize,
    pub total_count: usize,
    pub most_common: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorStats {
    pub column: String,
    pub error: String,
    pub count: usize,
}

impl ColumnStats {
    pub fn column(&self) -> &str {
        match self {
            ColumnStats::Numeric(s) => &s.column,
            ColumnStats::Datetime(s) => &s.column,
            ColumnStats::Categorical(s) | ColumnStats::Text(s) | ColumnStats::Empty(s) => {
                &s.column
            }
            ColumnStats::Error(s) => &s.column,
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            ColumnStats::Numeric(_) => "numeric",
            ColumnStats::Datetime(_) => "datetime",
            ColumnStats::Categorical(_) => "categorical",
            ColumnStats::Text(_) => "text",
            ColumnStats::Empty(_) => "empty",
            ColumnStats::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ColumnStats::Error(_))
    }
}

/// One record per table column, in column order. Columns missing from
/// `types` are summarized as text.
pub fn compute_stats(
    table: &UniformTable,
    types: &ColumnTypeMap,
    config: &AnalysisConfig,
) -> Vec<ColumnStats> {
    let stats: Vec<ColumnStats> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let kind = types.kind_at(idx).unwrap_or(ColumnKind::Text);
            compute_column(table, idx, kind, config).unwrap_or_else(|err| {
                warn!("Statistics for column '{name}' failed: {err:#}");
                ColumnStats::Error(ErrorStats {
                    column: name.clone(),
                    error: format!("{err:#}"),
                    count: table.non_missing(idx).count(),
                })
            })
        })
        .collect();
    info!(
        "Computed statistics for {} column(s) ({} failed)",
        stats.len(),
        stats.iter().filter(|s| s.is_error()).count()
    );
    stats
}

fn compute_column(
    table: &UniformTable,
    index: usize,
    kind: ColumnKind,
    config: &AnalysisConfig,
) -> Result<ColumnStats> {
    let column = table.columns()[index].clone();
    match kind {
        ColumnKind::Numeric => numeric_stats(table, index, column).map(ColumnStats::Numeric),
        ColumnKind::Datetime => {
            datetime_stats(table, index, column, &config.date_formats).map(ColumnStats::Datetime)
        }
        ColumnKind::Categorical => Ok(ColumnStats::Categorical(distribution(table, index, column))),
        ColumnKind::Text => Ok(ColumnStats::Text(distribution(table, index, column))),
        ColumnKind::Empty => Ok(ColumnStats::Empty(distribution(table, index, column))),
    }
}

fn numeric_stats(table: &UniformTable, index: usize, column: String) -> Result<NumericStats> {
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    for (row_idx, cell) in table.column(index).enumerate() {
        if cell.is_missing() {
            continue;
        }
        let Some(value) = cell.as_number() else {
            bail!(
                "Value '{}' in data row {} is not numeric",
                cell.as_display(),
                row_idx + 1
            );
        };
        sum += value;
        count += 1;
        min = Some(min.map_or(value, |current| current.min(value)));
        max = Some(max.map_or(value, |current| current.max(value)));
    }
    Ok(NumericStats {
        column,
        sum,
        mean: (count > 0).then(|| sum / count as f64),
        min,
        max,
        count,
    })
}

fn datetime_stats(
    table: &UniformTable,
    index: usize,
    column: String,
    formats: &[String],
) -> Result<DatetimeStats> {
    let format = detect_date_format(table.non_missing(index), formats)
        .ok_or_else(|| anyhow!("Values do not share a supported date format"))?;
    let dates: Vec<_> = table
        .non_missing(index)
        .filter_map(|cell| cell.as_date(format))
        .collect();
    let render = |date: &NaiveDate| date.format("%Y-%m-%d").to_string();
    Ok(DatetimeStats {
        column,
        min_date: dates.iter().min().map(render),
        max_date: dates.iter().max().map(render),
        count: dates.len(),
    })
}

fn distribution(table: &UniformTable, index: usize, column: String) -> DistributionStats {
    let counts = ValueCounts::from_cells(table.column(index));
    DistributionStats {
        column,
        unique_count: counts.unique(),
        total_count: counts.total(),
        most_common: counts.mode().map(str::to_string),
    }
}

pub fn render_headers() -> Vec<String> {
    ["column", "type", "count", "sum", "mean", "min", "max", "unique", "most_common"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Flattens records into console table rows matching [`render_headers`].
pub fn render_rows(stats: &[ColumnStats]) -> Vec<Vec<String>> {
    let metric = |value: Option<f64>| value.map(format_metric).unwrap_or_default();
    stats
        .iter()
        .map(|record| {
            let mut row = vec![record.column().to_string(), record.type_label().to_string()];
            match record {
                ColumnStats::Numeric(s) => row.extend([
                    s.count.to_string(),
                    format_metric(s.sum),
                    metric(s.mean),
                    metric(s.min),
                    metric(s.max),
                    String::new(),
                    String::new(),
                ]),
                ColumnStats::Datetime(s) => row.extend([
                    s.count.to_string(),
                    String::new(),
                    String::new(),
                    s.min_date.clone().unwrap_or_default(),
                    s.max_date.clone().unwrap_or_default(),
                    String::new(),
                    String::new(),
                ]),
                ColumnStats::Categorical(s) | ColumnStats::Text(s) | ColumnStats::Empty(s) => row
                    .extend([
                        s.total_count.to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        s.unique_count.to_string(),
                        s.most_common.clone().unwrap_or_default(),
                    ]),
                ColumnStats::Error(s) => row.extend([
                    s.count.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    s.error.clone(),
                ]),
            }
            row
        })
        .collect()
}

fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 {
        format_number(value)
    } else {
        format!("{value:.4}")
    }
}
