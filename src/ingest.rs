//! Format dispatch for the readers.
//!
//! [`ingest`] is the only entry point that turns a stored file into a
//! [`UniformTable`]. It always re-reads the file; nothing is cached between
//! calls. Reader failures collapse into one [`IngestError`].

use std::{fmt, path::Path, str::FromStr};

use log::debug;

use crate::{
    config::AnalysisConfig,
    delimited,
    error::IngestError,
    io_utils, pdf,
    spreadsheet::{self, SpreadsheetEngine},
    table::UniformTable,
};

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Xlsx,
    Xls,
    Pdf,
}

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Result<Self> {
        extension.parse()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Delimited => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
            SourceFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "csv" => Ok(SourceFormat::Delimited),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            "pdf" => Ok(SourceFormat::Pdf),
            _ => Err(IngestError::UnsupportedFormat {
                extension: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Reads `path` as `format`. A table without rows or columns is an
/// [`IngestError::EmptyResult`]; no partial table is ever returned.
pub fn ingest(path: &Path, format: SourceFormat, config: &AnalysisConfig) -> Result<UniformTable> {
    debug!("Ingesting {:?} as {}", path, format);
    let table = match format {
        SourceFormat::Delimited => {
            let bytes = io_utils::read_source(path).map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            delimited::read_delimited(path, &bytes, config)
        }
        SourceFormat::Xlsx => spreadsheet::read_spreadsheet(path, SpreadsheetEngine::Xlsx),
        SourceFormat::Xls => spreadsheet::read_spreadsheet(path, SpreadsheetEngine::Xls),
        SourceFormat::Pdf => pdf::read_pdf_table(path),
    }
    .map_err(|err| IngestError::corrupt(path, &err))?;

    if table.is_empty() {
        return Err(IngestError::empty(
            path,
            "the file is empty or contains no data",
        ));
    }
    Ok(table)
}

/// [`ingest`] with the format taken from the file extension.
pub fn ingest_path(path: &Path, config: &AnalysisConfig) -> Result<UniformTable> {
    let format = SourceFormat::from_path(path)?;
    ingest(path, format, config)
}
