use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, config::AnalysisConfig, ingest, table::UniformTable};

pub fn execute(args: &PreviewArgs, config: &AnalysisConfig) -> Result<()> {
    let table = ingest::ingest_path(&args.input, config)
        .with_context(|| format!("Previewing {:?}", args.input))?;
    let rows = display_rows(&table, args.rows);
    print_table(table.columns(), &rows);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        table.row_count(),
        args.input
    );
    Ok(())
}

/// The first `limit` rows as display text; missing cells are blank.
pub fn display_rows(table: &UniformTable, limit: usize) -> Vec<Vec<String>> {
    table
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|cell| cell.as_display()).collect())
        .collect()
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let flattened = flatten_controls(value);
            let padding = width.saturating_sub(display_width(&flattened));
            format!("{flattened}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn flatten_controls(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
