//! Error taxonomy surfaced by the ingestion layer.
//!
//! Reader internals work with `anyhow` and attach context as they go; the
//! public boundary collapses every failure into one [`IngestError`] whose
//! `Display` output is the single message a caller reports for the request.
//! Statistics failures are not represented here: they are isolated per
//! column and recorded inline as [`crate::stats::ColumnStats::Error`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file format '{extension}'. Supported: .csv, .xlsx, .xls, .pdf")]
    UnsupportedFormat { extension: String },

    #[error("Failed to read {path:?}: {reason}")]
    CorruptSource { path: PathBuf, reason: String },

    #[error("No usable data in {path:?}: {reason}")]
    EmptyResult { path: PathBuf, reason: String },

    #[error("I/O error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub fn corrupt(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        IngestError::CorruptSource {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }

    pub fn empty(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IngestError::EmptyResult {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
