//! Spreadsheet reader with engine fallback.
//!
//! The engine matching the extension is tried first and the other engine
//! second. Individual engine errors are logged; if both fail the caller gets
//! one generic "corrupted or unsupported" message.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Result, anyhow, bail};
use calamine::{Data, DataType, Range, Reader, Xls, Xlsx, open_workbook};
use chrono::Timelike;
use log::{debug, info};

use crate::{data::Cell, table::UniformTable};

pub const UNREADABLE_SPREADSHEET: &str =
    "could not read the spreadsheet; make sure the file is not corrupted and has a supported format";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetEngine {
    /// Office Open XML workbooks (`.xlsx`).
    Xlsx,
    /// Legacy BIFF workbooks (`.xls`).
    Xls,
}

impl SpreadsheetEngine {
    /// Attempt order starting with `self`.
    pub fn attempt_order(self) -> [SpreadsheetEngine; 2] {
        match self {
            SpreadsheetEngine::Xlsx => [SpreadsheetEngine::Xlsx, SpreadsheetEngine::Xls],
            SpreadsheetEngine::Xls => [SpreadsheetEngine::Xls, SpreadsheetEngine::Xlsx],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpreadsheetEngine::Xlsx => "xlsx",
            SpreadsheetEngine::Xls => "xls",
        }
    }

    fn first_sheet(self, path: &Path) -> Result<Range<Data>> {
        match self {
            SpreadsheetEngine::Xlsx => first_sheet_with::<Xlsx<BufReader<File>>>(path),
            SpreadsheetEngine::Xls => first_sheet_with::<Xls<BufReader<File>>>(path),
        }
    }
}

fn first_sheet_with<R>(path: &Path) -> Result<Range<Data>>
where
    R: Reader<BufReader<File>>,
{
    let mut workbook: R =
        open_workbook(path).map_err(|err| anyhow!("Opening workbook failed: {err:?}"))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook contains no worksheets"))?
        .map_err(|err| anyhow!("Reading first worksheet failed: {err:?}"))
}

pub fn read_spreadsheet(path: &Path, primary: SpreadsheetEngine) -> Result<UniformTable> {
    let mut failures = Vec::new();
    for engine in primary.attempt_order() {
        match engine.first_sheet(path) {
            Ok(range) => {
                let table = range_to_table(&range);
                info!(
                    "Read {} row(s) from {:?} with the {} engine",
                    table.row_count(),
                    path,
                    engine.name()
                );
                return Ok(table);
            }
            Err(err) => {
                debug!("Engine {} failed for {:?}: {err:#}", engine.name(), path);
                failures.push(engine.name());
            }
        }
    }
    debug!("All spreadsheet engines failed for {:?}: {:?}", path, failures);
    bail!(UNREADABLE_SPREADSHEET)
}

/// The first row of the range is the header; every following row becomes a
/// data row of the same width.
pub fn range_to_table(range: &Range<Data>) -> UniformTable {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return UniformTable::default();
    };
    let headers = header.iter().map(|cell| convert_cell(cell).as_display()).collect();
    let mut table = UniformTable::new(headers);
    for row in rows {
        table.push_row(row.iter().map(convert_cell).collect());
    }
    table
}

pub fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(value) if value.is_empty() => Cell::Empty,
        Data::String(value) => Cell::Text(value.clone()),
        Data::Bool(value) => Cell::Text(value.to_string()),
        other => match other.as_datetime() {
            Some(datetime) if datetime.time().num_seconds_from_midnight() == 0 => {
                Cell::Text(datetime.format("%Y-%m-%d").to_string())
            }
            Some(datetime) => Cell::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Text(other.to_string()),
        },
    }
}
