use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::config::AnalysisConfig;

/// A single scalar cell of a [`crate::table::UniformTable`].
///
/// Readers convert whatever their source produces into this closed set once;
/// the engines downstream never see any other representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Builds a text cell, mapping an empty field or a configured NA marker to
    /// [`Cell::Empty`]. Whitespace-only fields stay text.
    pub fn from_text(raw: &str, config: &AnalysisConfig) -> Self {
        if raw.is_empty() || config.is_missing_marker(raw) {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the cell. Text must pass [`parse_strict_number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_strict_number(s),
        }
    }

    /// Date view of the cell. Numbers never parse as dates.
    pub fn as_date(&self, format: &str) -> Option<NaiveDate> {
        match self {
            Cell::Text(s) => parse_date(s, format),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Empty => serializer.serialize_str(""),
            Cell::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64
}

pub fn format_number(value: f64) -> String {
    if is_integral(value) {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Parses a plain ASCII decimal: optional sign, digits with an optional
/// fraction, optional exponent. Surrounding whitespace is ignored. Thousands
/// separators, decimal commas, `inf`, `nan` and hex are rejected.
pub fn parse_strict_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if !is_strict_decimal(trimmed.as_bytes()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_strict_decimal(bytes: &[u8]) -> bool {
    let mut idx = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        idx += 1;
    }
    let int_digits = count_digits(&bytes[idx..]);
    idx += int_digits;
    let mut frac_digits = 0;
    if bytes.get(idx) == Some(&b'.') {
        idx += 1;
        frac_digits = count_digits(&bytes[idx..]);
        idx += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    if matches!(bytes.get(idx), Some(b'e' | b'E')) {
        idx += 1;
        if matches!(bytes.get(idx), Some(b'+' | b'-')) {
            idx += 1;
        }
        let exp_digits = count_digits(&bytes[idx..]);
        if exp_digits == 0 {
            return false;
        }
        idx += exp_digits;
    }
    idx == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

pub fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format).ok()
}

/// Returns the first format under which every cell parses as a date.
/// An empty input matches nothing.
pub fn detect_date_format<'a, 'c, I>(cells: I, formats: &'a [String]) -> Option<&'a str>
where
    I: IntoIterator<Item = &'c Cell>,
    I::IntoIter: Clone,
{
    let cells = cells.into_iter();
    if cells.clone().next().is_none() {
        return None;
    }
    formats
        .iter()
        .map(String::as_str)
        .find(|fmt| cells.clone().all(|cell| cell.as_date(fmt).is_some()))
}
