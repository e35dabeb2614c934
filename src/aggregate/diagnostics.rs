//! Skip-and-tally bookkeeping for rejected incident records

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Why an incident record was left out of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Record is not an object or a field has the wrong type
    Malformed,
    /// No `created_at` value
    MissingCreatedAt,
    /// `created_at` is present but not a recognizable timestamp
    UnparseableCreatedAt,
    /// No severity (`impact`) value, or an empty one
    MissingSeverity,
    /// Another record with the same `id` was already counted
    DuplicateId,
}

impl SkipReason {
    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::Malformed => "malformed record",
            SkipReason::MissingCreatedAt => "missing created_at",
            SkipReason::UnparseableCreatedAt => "unparseable created_at",
            SkipReason::MissingSeverity => "missing severity",
            SkipReason::DuplicateId => "duplicate id",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Counts of accepted and skipped records for one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Records that contributed to the table
    pub accepted: usize,

    /// Rejected records grouped by reason
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl Diagnostics {
    /// Tally `count` records skipped for `reason`
    pub fn record_skip(&mut self, reason: SkipReason, count: usize) {
        if count > 0 {
            *self.skipped.entry(reason).or_insert(0) += count;
        }
    }

    /// Number of records skipped for `reason`
    #[cfg(test)]
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Total number of skipped records
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// True when records existed but none were usable
    pub fn all_rejected(&self) -> bool {
        self.accepted == 0 && self.skipped_total() > 0
    }

    /// One-line summary such as `missing created_at: 2, duplicate id: 1`
    pub fn summary(&self) -> String {
        self.skipped
            .iter()
            .map(|(reason, count)| format!("{}: {}", reason, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_total() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record_skip(SkipReason::MissingCreatedAt, 1);
        diagnostics.record_skip(SkipReason::MissingCreatedAt, 2);
        diagnostics.record_skip(SkipReason::DuplicateId, 1);
        diagnostics.record_skip(SkipReason::Malformed, 0);

        assert_eq!(diagnostics.skipped_for(SkipReason::MissingCreatedAt), 3);
        assert_eq!(diagnostics.skipped_for(SkipReason::Malformed), 0);
        assert_eq!(diagnostics.skipped_total(), 4);
        assert!(!diagnostics.skipped.contains_key(&SkipReason::Malformed));
    }

    #[test]
    fn test_summary_lists_reasons() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record_skip(SkipReason::DuplicateId, 1);
        diagnostics.record_skip(SkipReason::MissingCreatedAt, 2);

        assert_eq!(diagnostics.summary(), "missing created_at: 2, duplicate id: 1");
    }

    #[test]
    fn test_all_rejected() {
        let mut diagnostics = Diagnostics::default();
        assert!(!diagnostics.all_rejected());

        diagnostics.record_skip(SkipReason::MissingSeverity, 1);
        assert!(diagnostics.all_rejected());

        diagnostics.accepted = 1;
        assert!(!diagnostics.all_rejected());
    }

    #[test]
    fn test_serializes_reasons_as_snake_case() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record_skip(SkipReason::UnparseableCreatedAt, 1);

        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["skipped"]["unparseable_created_at"], 1);
        assert_eq!(json["accepted"], 0);
    }
}
