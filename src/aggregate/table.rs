//! Monthly severity count matrix

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::MonthKey;

/// Per-severity counts for one month
pub type SeverityCounts = BTreeMap<String, u64>;

/// Month -> severity label -> incident count.
///
/// Once built by the aggregator the table is dense: every month carries a
/// count (possibly 0) for every severity label seen anywhere in the input.
/// Months enumerate in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregationTable {
    months: BTreeMap<MonthKey, SeverityCounts>,
}

impl AggregationTable {
    /// Count one incident in `month` with severity `label`
    pub(crate) fn increment(&mut self, month: MonthKey, label: &str) {
        let counts = self.months.entry(month).or_default();
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Give every month an explicit entry for every observed label
    pub(crate) fn densify(&mut self) {
        let labels: BTreeSet<String> = self
            .months
            .values()
            .flat_map(|counts| counts.keys().cloned())
            .collect();

        for counts in self.months.values_mut() {
            for label in &labels {
                counts.entry(label.clone()).or_insert(0);
            }
        }
    }

    /// Month keys in chronological order
    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months.keys().copied()
    }

    /// Every severity label observed, sorted
    pub fn severities(&self) -> Vec<&str> {
        let labels: BTreeSet<&str> = self
            .months
            .values()
            .flat_map(|counts| counts.keys().map(String::as_str))
            .collect();
        labels.into_iter().collect()
    }

    /// Count for one cell, 0 when absent
    pub fn count(&self, month: MonthKey, label: &str) -> u64 {
        self.months
            .get(&month)
            .and_then(|counts| counts.get(label))
            .copied()
            .unwrap_or(0)
    }

    /// Number of months
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Incidents counted in `month`
    pub fn month_total(&self, month: MonthKey) -> u64 {
        self.months
            .get(&month)
            .map(|counts| counts.values().sum::<u64>())
            .unwrap_or(0)
    }

    /// Incidents counted across the whole table
    pub fn total(&self) -> u64 {
        self.months.values().flat_map(|counts| counts.values()).sum()
    }
}
