//! Analysis configuration.
//!
//! Every cap and threshold used by the engines lives in [`AnalysisConfig`] and
//! is passed by reference into each call. A YAML file may override any subset
//! of fields; the rest keep their defaults.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_SIZE: usize = 100;
pub const DEFAULT_PREVIEW_ROWS: usize = 100;
pub const DEFAULT_BAR_TOP_GROUPS: usize = 10;
pub const DEFAULT_LINE_POINTS: usize = 20;
pub const DEFAULT_SNIFF_BYTES: usize = 1024;

const DEFAULT_ENCODINGS: &[&str] = &["utf-8", "cp1251", "latin-1", "iso-8859-1"];
const DEFAULT_DELIMITERS: &[char] = &[',', ';', '\t', '|'];
const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];
const DEFAULT_MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum non-missing values per column examined by type inference.
    pub sample_size: usize,
    /// Rows included in the report's preview window.
    pub preview_rows: usize,
    pub bar_top_groups: usize,
    pub line_points: usize,
    pub bar_category_candidates: usize,
    pub bar_value_candidates: usize,
    pub line_date_candidates: usize,
    pub line_value_candidates: usize,
    /// A column is categorical when `unique / total` is strictly below this.
    pub categorical_max_ratio: f64,
    /// ...and its distinct count is strictly below this.
    pub categorical_max_unique: usize,
    pub sniff_bytes: usize,
    pub encodings: Vec<String>,
    pub delimiter_candidates: Vec<char>,
    pub date_formats: Vec<String>,
    pub missing_markers: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            bar_top_groups: DEFAULT_BAR_TOP_GROUPS,
            line_points: DEFAULT_LINE_POINTS,
            bar_category_candidates: 2,
            bar_value_candidates: 2,
            line_date_candidates: 1,
            line_value_candidates: 1,
            categorical_max_ratio: 0.5,
            categorical_max_unique: 50,
            sniff_bytes: DEFAULT_SNIFF_BYTES,
            encodings: DEFAULT_ENCODINGS.iter().map(|s| s.to_string()).collect(),
            delimiter_candidates: DEFAULT_DELIMITERS.to_vec(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            missing_markers: DEFAULT_MISSING_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening configuration file {path:?}"))?;
        let config: AnalysisConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing configuration file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.sample_size > 0, "sample_size must be positive");
        ensure!(
            (0.0..=1.0).contains(&self.categorical_max_ratio),
            "categorical_max_ratio must be within 0.0..=1.0"
        );
        ensure!(!self.encodings.is_empty(), "At least one encoding is required");
        ensure!(
            self.delimiter_candidates.iter().all(char::is_ascii),
            "Delimiter candidates must be ASCII characters"
        );
        ensure!(
            !self.date_formats.is_empty(),
            "At least one date format is required"
        );
        Ok(())
    }

    pub fn delimiter_bytes(&self) -> Vec<u8> {
        self.delimiter_candidates
            .iter()
            .filter(|c| c.is_ascii())
            .map(|c| *c as u8)
            .collect()
    }

    pub fn is_missing_marker(&self, value: &str) -> bool {
        self.missing_markers.iter().any(|marker| marker == value)
    }
}
