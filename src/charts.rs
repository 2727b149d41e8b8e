//! Chart data derivation.
//!
//! At most one bar chart and one line chart are produced per table. Column
//! pairing is "first match wins": the candidate lists are walked in column
//! order and the first usable pair ends the search.

use log::{debug, info};
use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    data::detect_date_format,
    frequency::grouped_sums,
    schema::{ColumnKind, ColumnTypeMap},
    table::UniformTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub category: String,
    pub value: String,
    pub data: ChartSeries,
}

/// Aligned label/value sequences. `None` values serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Derives zero, one or two charts from `table`.
///
/// When `selected_category` names a categorical column, the bar chart is
/// built from that column only. Any other selection is ignored.
pub fn derive_charts(
    table: &UniformTable,
    types: &ColumnTypeMap,
    selected_category: Option<&str>,
    config: &AnalysisConfig,
) -> Vec<ChartSpec> {
    let numeric = types.indices_of(ColumnKind::Numeric);
    let datetime = types.indices_of(ColumnKind::Datetime);
    let mut categorical = types.indices_of(ColumnKind::Categorical);

    if let Some(selected) = selected_category {
        match categorical
            .iter()
            .copied()
            .find(|idx| table.columns()[*idx] == selected)
        {
            Some(idx) => categorical = vec![idx],
            None => debug!("Selected category '{selected}' is not categorical; ignoring"),
        }
    }

    let mut charts = Vec::new();
    if let Some(chart) = bar_chart(table, &categorical, &numeric, config) {
        charts.push(chart);
    }
    if let Some(chart) = line_chart(table, &datetime, &numeric, config) {
        charts.push(chart);
    }
    info!("Derived {} chart(s)", charts.len());
    charts
}

fn bar_chart(
    table: &UniformTable,
    categorical: &[usize],
    numeric: &[usize],
    config: &AnalysisConfig,
) -> Option<ChartSpec> {
    let columns = table.columns();
    for &category_idx in categorical.iter().take(config.bar_category_candidates) {
        for &value_idx in numeric.iter().take(config.bar_value_candidates) {
            let (category, value) = (&columns[category_idx], &columns[value_idx]);
            if category == value {
                continue;
            }
            let groups = grouped_sums(table, category_idx, value_idx);
            debug!(
                "Bar chart '{value}' by '{category}': {} group(s), keeping {}",
                groups.len(),
                config.bar_top_groups.min(groups.len())
            );
            let (labels, values) = groups
                .into_iter()
                .take(config.bar_top_groups)
                .map(|(label, sum)| (label, Some(sum)))
                .unzip();
            return Some(ChartSpec {
                kind: ChartKind::Bar,
                title: format!("{value} by {category}"),
                category: category.clone(),
                value: value.clone(),
                data: ChartSeries { labels, values },
            });
        }
    }
    None
}

fn line_chart(
    table: &UniformTable,
    datetime: &[usize],
    numeric: &[usize],
    config: &AnalysisConfig,
) -> Option<ChartSpec> {
    let columns = table.columns();
    for &date_idx in datetime.iter().take(config.line_date_candidates) {
        for &value_idx in numeric.iter().take(config.line_value_candidates) {
            let (date, value) = (&columns[date_idx], &columns[value_idx]);
            if date == value {
                continue;
            }
            // format comes from the inference sample; later rows that do not
            // parse under it are dropped from the series
            let sample = table.non_missing(date_idx).take(config.sample_size);
            let Some(format) = detect_date_format(sample, &config.date_formats) else {
                debug!("Line chart skipped: column '{date}' has no common date format");
                return None;
            };

            let mut points: Vec<_> = table
                .rows()
                .iter()
                .filter_map(|row| {
                    row[date_idx]
                        .as_date(format)
                        .map(|day| (day, row[value_idx].as_number()))
                })
                .collect();
            points.sort_by_key(|(day, _)| *day);
            let recent = points.split_off(points.len().saturating_sub(config.line_points));

            let (labels, values) = recent
                .into_iter()
                .map(|(day, amount)| (day.format("%Y-%m-%d").to_string(), amount))
                .unzip();
            return Some(ChartSpec {
                kind: ChartKind::Line,
                title: format!("{value} over time ({date})"),
                category: date.clone(),
                value: value.clone(),
                data: ChartSeries { labels, values },
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Cell, schema::infer_types};

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> UniformTable {
        UniformTable::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| text(v)).collect())
                .collect(),
        )
    }

    fn charts_for(table: &UniformTable, selected: Option<&str>) -> Vec<ChartSpec> {
        let config = AnalysisConfig::default();
        let types = infer_types(table, &config);
        derive_charts(table, &types, selected, &config)
    }

    #[test]
    fn bar_chart_orders_groups_by_sum() {
        let table = table(
            &["dept", "salary"],
            &[&["IT", "50"], &["HR", "60"], &["IT", "55"], &["IT", "70"]],
        );
        // half the values distinct: inference alone would call `dept` text
        let types = ColumnTypeMap::from_entries(vec![
            ("dept".into(), ColumnKind::Categorical),
            ("salary".into(), ColumnKind::Numeric),
        ]);
        let charts = derive_charts(&table, &types, None, &AnalysisConfig::default());
        assert_eq!(charts.len(), 1);
        let bar = &charts[0];
        assert_eq!(bar.kind, ChartKind::Bar);
        assert_eq!(bar.title, "salary by dept");
        assert_eq!(bar.data.labels, ["IT", "HR"]);
        assert_eq!(bar.data.values, [Some(175.0), Some(60.0)]);
    }

    #[test]
    fn bar_chart_keeps_top_groups_only() {
        let rows: Vec<Vec<String>> = (0..60)
            .map(|i| vec![format!("g{:02}", i % 12), i.to_string()])
            .collect();
        let rows: Vec<Vec<Cell>> = rows
            .iter()
            .map(|row| row.iter().map(|v| text(v)).collect())
            .collect();
        let table = UniformTable::from_rows(vec!["group".into(), "n".into()], rows);
        let types = ColumnTypeMap::from_entries(vec![
            ("group".into(), ColumnKind::Categorical),
            ("n".into(), ColumnKind::Numeric),
        ]);
        let charts = derive_charts(&table, &types, None, &AnalysisConfig::default());
        assert_eq!(charts[0].data.len(), 10);
        assert_eq!(charts[0].data.labels[0], "g11");
    }

    #[test]
    fn line_chart_takes_most_recent_points_ascending() {
        let rows: Vec<Vec<Cell>> = (1..=25)
            .rev()
            .map(|day| vec![text(&format!("2024-03-{day:02}")), text(&day.to_string())])
            .collect();
        let table = UniformTable::from_rows(vec!["date".into(), "amount".into()], rows);
        let charts = charts_for(&table, None);
        assert_eq!(charts.len(), 1);
        let line = &charts[0];
        assert_eq!(line.kind, ChartKind::Line);
        assert_eq!(line.title, "amount over time (date)");
        assert_eq!(line.data.len(), 20);
        assert_eq!(line.data.labels.first().map(String::as_str), Some("2024-03-06"));
        assert_eq!(line.data.labels.last().map(String::as_str), Some("2024-03-25"));
        assert_eq!(line.data.values[0], Some(6.0));
    }

    #[test]
    fn line_chart_emits_null_for_missing_values() {
        let table = UniformTable::from_rows(
            vec!["date".into(), "amount".into()],
            vec![
                vec![text("2024-01-02"), text("5")],
                vec![text("2024-01-01"), Cell::Empty],
                vec![Cell::Empty, text("9")],
            ],
        );
        let charts = charts_for(&table, None);
        assert_eq!(charts[0].data.labels, ["2024-01-01", "2024-01-02"]);
        assert_eq!(charts[0].data.values, [None, Some(5.0)]);
    }

    #[test]
    fn selected_category_overrides_first_categorical() {
        let table = table(
            &["dept", "site", "salary"],
            &[
                &["IT", "north", "10"],
                &["HR", "south", "20"],
                &["IT", "north", "30"],
                &["IT", "south", "40"],
                &["HR", "north", "50"],
            ],
        );
        let default = charts_for(&table, None);
        assert_eq!(default[0].category, "dept");

        let selected = charts_for(&table, Some("site"));
        assert_eq!(selected[0].category, "site");
        assert_eq!(selected[0].data.labels, ["north", "south"]);

        let ignored = charts_for(&table, Some("salary"));
        assert_eq!(ignored[0].category, "dept");
    }

    #[test]
    fn unsuitable_columns_yield_no_charts() {
        let table = table(&["name", "note"], &[&["Ann", "x"], &["Bob", "y"]]);
        assert!(charts_for(&table, None).is_empty());
    }

    #[test]
    fn line_chart_drops_dates_past_the_sample_that_do_not_parse() {
        let config = AnalysisConfig {
            sample_size: 2,
            ..AnalysisConfig::default()
        };
        let table = UniformTable::from_rows(
            vec!["date".into(), "amount".into()],
            vec![
                vec![text("2024-01-01"), text("1")],
                vec![text("2024-01-02"), text("2")],
                vec![text("soon"), text("3")],
            ],
        );
        let types = infer_types(&table, &config);
        let charts = derive_charts(&table, &types, None, &config);
        assert_eq!(charts[0].kind, ChartKind::Line);
        assert_eq!(charts[0].data.labels, ["2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn chart_serializes_kind_as_type() {
        let chart = ChartSpec {
            kind: ChartKind::Line,
            title: "t".into(),
            category: "d".into(),
            value: "v".into(),
            data: ChartSeries {
                labels: vec!["2024-01-01".into()],
                values: vec![None],
            },
        };
        let json = serde_json::to_value(&chart).expect("serialize");
        assert_eq!(json["type"], "line");
        assert_eq!(json["data"]["values"][0], serde_json::Value::Null);
    }
}
