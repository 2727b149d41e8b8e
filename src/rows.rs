//! Paginated row access.
//!
//! Every call re-reads the source through [`crate::ingest::ingest`]; no
//! parsed table outlives the call.

use std::path::Path;

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    config::AnalysisConfig,
    ingest::{self, Result, SourceFormat},
    table::UniformTable,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowWindow {
    /// Rows as column → value records; missing cells render as `""`.
    pub rows: Vec<Map<String, JsonValue>>,
    pub has_more: bool,
    /// Offset to request next. Equals the requested offset when the window
    /// is empty.
    pub next_offset: usize,
}

/// Returns rows `[offset, min(offset + limit, total))` of the file at `path`.
///
/// An offset at or past the end is not an error: the window is empty and
/// `has_more` is false.
pub fn paginate(
    path: &Path,
    format: SourceFormat,
    offset: usize,
    limit: usize,
    config: &AnalysisConfig,
) -> Result<RowWindow> {
    let table = ingest::ingest(path, format, config)?;
    let window = window(&table, offset, limit);
    debug!(
        "Returning {} row(s) from offset {} of {:?} (has_more: {})",
        window.rows.len(),
        offset,
        path,
        window.has_more
    );
    Ok(window)
}

pub fn window(table: &UniformTable, offset: usize, limit: usize) -> RowWindow {
    let total = table.row_count();
    if offset >= total {
        return RowWindow {
            rows: Vec::new(),
            has_more: false,
            next_offset: offset,
        };
    }
    let end = offset.saturating_add(limit).min(total);
    RowWindow {
        rows: table.records(offset, end),
        has_more: end < total,
        next_offset: end,
    }
}
