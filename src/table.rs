//! The uniform table every reader produces and every engine consumes.

use serde_json::{Map, Value as JsonValue};

use crate::data::Cell;

/// Ordered column names plus positional rows.
///
/// Column names may repeat. Every row holds exactly one cell per column:
/// [`UniformTable::push_row`] pads short rows with [`Cell::Empty`] and
/// truncates long ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl UniformTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// First column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + Clone + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn non_missing(&self, index: usize) -> impl Iterator<Item = &Cell> + Clone + '_ {
        self.column(index).filter(|cell| !cell.is_missing())
    }

    /// Keeps only the columns whose index satisfies `keep`.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &str) -> bool,
    {
        let mask: Vec<bool> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| keep(idx, name))
            .collect();
        let mut idx = 0;
        self.columns.retain(|_| {
            idx += 1;
            mask[idx - 1]
        });
        for row in &mut self.rows {
            let mut idx = 0;
            row.retain(|_| {
                idx += 1;
                mask[idx - 1]
            });
        }
    }

    pub fn retain_rows<F>(&mut self, keep: F)
    where
        F: FnMut(&Vec<Cell>) -> bool,
    {
        self.rows.retain(keep);
    }

    /// Rows `[start, end)` rendered as column → value records, missing cells
    /// as `""`. Repeated column names keep the last value.
    pub fn records(&self, start: usize, end: usize) -> Vec<Map<String, JsonValue>> {
        let end = end.min(self.rows.len());
        if start >= end {
            return Vec::new();
        }
        self.rows[start..end]
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), cell_to_json(cell)))
                    .collect()
            })
            .collect()
    }
}

fn cell_to_json(cell: &Cell) -> JsonValue {
    serde_json::to_value(cell).unwrap_or(JsonValue::Null)
}
