//! Column kind inference.
//!
//! Each column is classified independently from a bounded sample of its
//! leading non-missing values. The checks run in a fixed priority order and
//! the first that accepts the whole sample decides the kind:
//!
//! 1. blank header or no values → [`ColumnKind::Empty`]
//! 2. every value numeric → [`ColumnKind::Numeric`]
//! 3. every value a date under one configured format → [`ColumnKind::Datetime`]
//! 4. few distinct values → [`ColumnKind::Categorical`], otherwise [`ColumnKind::Text`]
//!
//! Values can satisfy several tests (`"1"` is also a low-cardinality label),
//! so the order is part of the contract.

use std::{collections::HashSet, fmt};

use log::debug;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{
    config::AnalysisConfig,
    data::{Cell, detect_date_format},
    table::UniformTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Datetime,
    Categorical,
    Text,
    Empty,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Datetime => "datetime",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One kind per table column, in column order.
///
/// Lookups by name resolve to the first column carrying that name; positional
/// access stays exact when names repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTypeMap {
    entries: Vec<(String, ColumnKind)>,
}

impl ColumnTypeMap {
    pub fn from_entries(entries: Vec<(String, ColumnKind)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<ColumnKind> {
        self.entries
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, kind)| *kind)
    }

    pub fn kind_at(&self, index: usize) -> Option<ColumnKind> {
        self.entries.get(index).map(|(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Column positions of the given kind, in column order.
    pub fn indices_of(&self, kind: ColumnKind) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, (_, k))| *k == kind)
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Serialize for ColumnTypeMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, kind) in &self.entries {
            map.serialize_entry(name, kind)?;
        }
        map.end()
    }
}

pub fn infer_types(table: &UniformTable, config: &AnalysisConfig) -> ColumnTypeMap {
    let entries = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let kind = infer_column_kind(name, table.column(idx), config);
            debug!("Column '{name}' inferred as {kind}");
            (name.clone(), kind)
        })
        .collect();
    ColumnTypeMap::from_entries(entries)
}

pub fn infer_column_kind<'a, I>(header: &str, cells: I, config: &AnalysisConfig) -> ColumnKind
where
    I: IntoIterator<Item = &'a Cell>,
{
    if header.trim().is_empty() {
        return ColumnKind::Empty;
    }
    let sample: Vec<&Cell> = cells
        .into_iter()
        .filter(|cell| !cell.is_missing())
        .take(config.sample_size)
        .collect();
    if sample.is_empty() {
        return ColumnKind::Empty;
    }
    if sample.iter().all(|cell| cell.as_number().is_some()) {
        return ColumnKind::Numeric;
    }
    if detect_date_format(sample.iter().copied(), &config.date_formats).is_some() {
        return ColumnKind::Datetime;
    }

    let total = sample.len();
    let unique = sample
        .iter()
        .map(|cell| cell.as_display())
        .collect::<HashSet<_>>()
        .len();
    let ratio = unique as f64 / total as f64;
    if ratio < config.categorical_max_ratio && unique < config.categorical_max_unique {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}
