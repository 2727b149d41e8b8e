use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;

use crate::{data::Cell, table::UniformTable};

/// Occurrence counts of the non-missing values of one column, keyed by
/// display text.
#[derive(Debug, Default, Clone)]
pub struct ValueCounts {
    counts: HashMap<String, usize>,
    total: usize,
}

impl ValueCounts {
    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut counts = ValueCounts::default();
        for cell in cells {
            counts.record(cell);
        }
        counts
    }

    pub fn record(&mut self, cell: &Cell) {
        if cell.is_missing() {
            return;
        }
        *self.counts.entry(cell.as_display()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Most frequent value; ties resolve to the smallest text.
    pub fn mode(&self) -> Option<&str> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(value, _)| value.as_str())
    }
}

/// Sums `value_index` per distinct `category_index` value.
///
/// Rows with a missing category are ignored and non-numeric values add
/// nothing. Groups come back ordered by sum, largest first, ties by label.
pub fn grouped_sums(
    table: &UniformTable,
    category_index: usize,
    value_index: usize,
) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for row in table.rows() {
        let category = &row[category_index];
        if category.is_missing() {
            continue;
        }
        let sum = groups.entry(category.as_display()).or_insert(0.0);
        if let Some(value) = row[value_index].as_number() {
            *sum += value;
        }
    }
    groups
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1))
        .collect()
}
