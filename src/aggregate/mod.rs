//! Incident aggregation
//!
//! Turns raw incident records into a dense month x severity count table.
//! Records that cannot be placed are skipped and tallied in [`Diagnostics`]
//! rather than aborting the run.

pub mod diagnostics;
pub mod month;
pub mod table;

pub use diagnostics::{Diagnostics, SkipReason};
pub use month::MonthKey;
pub use table::AggregationTable;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::client::{IncidentFeed, RawIncident};
use crate::error::Result;

/// Result of one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub table: AggregationTable,
    pub diagnostics: Diagnostics,
}

/// Parse an incident timestamp into UTC.
///
/// Accepts RFC 3339 with `Z` or a numeric offset. A timestamp without any
/// offset is taken to already be UTC.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Build the month x severity table from decoded records.
///
/// A record is counted only when it has a parseable `created_at`, a
/// non-empty severity and an id not already counted. Severity labels are
/// used verbatim. The resulting table is dense across all observed labels.
pub fn process(incidents: &[RawIncident]) -> Aggregation {
    let aggregation = aggregate(incidents);
    report(&aggregation);
    aggregation
}

/// Decode a raw feed body and aggregate it.
///
/// Only a body that is not an incident feed at all is an error; records with
/// the wrong shape are tallied as [`SkipReason::Malformed`].
pub fn process_payload(bytes: &[u8]) -> Result<Aggregation> {
    let feed = IncidentFeed::parse(bytes)?;
    let mut aggregation = aggregate(&feed.incidents);
    aggregation
        .diagnostics
        .record_skip(SkipReason::Malformed, feed.malformed);
    report(&aggregation);
    Ok(aggregation)
}

fn aggregate(incidents: &[RawIncident]) -> Aggregation {
    let mut aggregation = Aggregation::default();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for incident in incidents {
        match classify(incident, &seen_ids) {
            Ok((month, severity)) => {
                aggregation.table.increment(month, severity);
                aggregation.diagnostics.accepted += 1;
                if let Some(id) = incident.id.as_deref() {
                    seen_ids.insert(id);
                }
            }
            Err(reason) => {
                log::debug!(
                    "Skipping incident {}: {}",
                    incident.id.as_deref().unwrap_or("<no id>"),
                    reason
                );
                aggregation.diagnostics.record_skip(reason, 1);
            }
        }
    }

    aggregation.table.densify();
    aggregation
}

fn classify<'a>(
    incident: &'a RawIncident,
    seen_ids: &HashSet<&str>,
) -> std::result::Result<(MonthKey, &'a str), SkipReason> {
    let created_at = incident
        .created_at
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(SkipReason::MissingCreatedAt)?;
    let created_at = parse_created_at(created_at).ok_or(SkipReason::UnparseableCreatedAt)?;

    let severity = incident
        .impact
        .as_deref()
        .filter(|label| !label.is_empty())
        .ok_or(SkipReason::MissingSeverity)?;

    if let Some(id) = incident.id.as_deref()
        && seen_ids.contains(id)
    {
        return Err(SkipReason::DuplicateId);
    }

    Ok((MonthKey::from_datetime(&created_at), severity))
}

fn report(aggregation: &Aggregation) {
    let diagnostics = &aggregation.diagnostics;
    log::info!(
        "Aggregated {} incidents into {} months",
        diagnostics.accepted,
        aggregation.table.len()
    );
    if diagnostics.skipped_total() > 0 {
        log::warn!(
            "Skipped {} incident records ({})",
            diagnostics.skipped_total(),
            diagnostics.summary()
        );
    }
}
