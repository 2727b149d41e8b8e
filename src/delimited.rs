//! Delimited-text reader.
//!
//! The delimiter is detected once from the leading sample. Each configured
//! encoding is then tried in order and the first that decodes cleanly and
//! yields at least one data row wins. When none do, a final UTF-8 pass runs
//! and its outcome, success or failure, is returned as is.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    config::AnalysisConfig,
    data::Cell,
    io_utils::{self, printable_delimiter},
    table::UniformTable,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    pub rows: usize,
    pub skipped: usize,
}

pub fn read_delimited(path: &Path, bytes: &[u8], config: &AnalysisConfig) -> Result<UniformTable> {
    let (sample, truncated) = io_utils::sample_bytes(bytes, config.sniff_bytes);
    let delimiter = io_utils::detect_delimiter(sample, truncated, &config.delimiter_bytes());
    debug!(
        "Using delimiter '{}' for {:?}",
        printable_delimiter(delimiter),
        path
    );

    for label in &config.encodings {
        let encoding = match io_utils::resolve_encoding(label) {
            Ok(encoding) => encoding,
            Err(err) => {
                debug!("Skipping encoding candidate: {err}");
                continue;
            }
        };
        match parse_with_encoding(bytes, delimiter, encoding, config) {
            Ok((table, summary)) if !table.is_empty() => {
                info!(
                    "Read {} row(s) from {:?} as {} (skipped {})",
                    summary.rows,
                    path,
                    encoding.name(),
                    summary.skipped
                );
                return Ok(table);
            }
            Ok(_) => debug!("Encoding {} produced no rows for {:?}", encoding.name(), path),
            Err(err) => debug!("Encoding {} failed for {:?}: {err:#}", encoding.name(), path),
        }
    }

    debug!("Falling back to UTF-8 for {:?}", path);
    let (table, _) = parse_with_encoding(bytes, delimiter, UTF_8, config)
        .with_context(|| format!("Reading {path:?} as UTF-8"))?;
    Ok(table)
}

/// Decodes `bytes` strictly and splits them into a table. The first record is
/// the header. Records wider than the header, or that fail to tokenize, are
/// skipped; narrower records are padded with empty cells.
pub fn parse_with_encoding(
    bytes: &[u8],
    delimiter: u8,
    encoding: &'static Encoding,
    config: &AnalysisConfig,
) -> Result<(UniformTable, ParseSummary)> {
    let text = io_utils::decode_bytes(bytes, encoding)?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let mut records = reader.records();

    let headers = match records.next() {
        Some(record) => record
            .context("Reading header row")?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>(),
        None => return Ok((UniformTable::default(), ParseSummary::default())),
    };
    let width = headers.len();
    let mut table = UniformTable::new(headers);
    let mut summary = ParseSummary::default();

    for (idx, record) in records.enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!("Skipping malformed row {}: {err}", idx + 2);
                summary.skipped += 1;
                continue;
            }
        };
        if record.len() > width {
            debug!(
                "Skipping row {}: expected {} field(s), saw {}",
                idx + 2,
                width,
                record.len()
            );
            summary.skipped += 1;
            continue;
        }
        let row = record
            .iter()
            .map(|field| Cell::from_text(field, config))
            .collect();
        table.push_row(row);
        summary.rows += 1;
    }

    Ok((table, summary))
}
