//! Incident feed payload models
//!
//! Statuspage returns `{"page": {...}, "incidents": [...]}`. Records are
//! decoded one at a time so a single record with the wrong shape is counted
//! as malformed instead of failing the whole feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A single incident record as published by the status page.
///
/// Every field is optional at this layer; the aggregator decides which
/// missing fields make a record unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIncident {
    /// Opaque incident identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Incident title
    #[serde(default)]
    pub name: Option<String>,

    /// Creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,

    /// Severity label (`none`, `minor`, `major`, `critical`, ...)
    #[serde(default)]
    pub impact: Option<String>,

    /// Timeline of status updates
    #[serde(default)]
    pub incident_updates: Option<Vec<Value>>,
}

/// Decoded incident feed
#[derive(Debug, Clone, Default)]
pub struct IncidentFeed {
    /// Records that decoded into [`RawIncident`]
    pub incidents: Vec<RawIncident>,

    /// Records whose shape could not be decoded
    pub malformed: usize,
}

#[derive(Deserialize)]
struct Envelope {
    incidents: Vec<Value>,
}

impl IncidentFeed {
    /// Parse a raw response body.
    ///
    /// Fails only when the body is not JSON or has no `incidents` array.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let envelope = Self::envelope(bytes).map_err(Error::Parse)?;

        let mut feed = IncidentFeed::default();
        for record in envelope.incidents {
            match serde_json::from_value::<RawIncident>(record) {
                Ok(incident) => feed.incidents.push(incident),
                Err(e) => {
                    log::debug!("Malformed incident record: {}", e);
                    feed.malformed += 1;
                }
            }
        }

        log::info!(
            "Decoded {} incident records ({} malformed)",
            feed.incidents.len(),
            feed.malformed
        );
        Ok(feed)
    }

    /// Check that a body is an incident feed without decoding its records
    pub fn validate(bytes: &[u8]) -> std::result::Result<(), String> {
        Self::envelope(bytes).map(|_| ())
    }

    fn envelope(bytes: &[u8]) -> std::result::Result<Envelope, String> {
        serde_json::from_slice(bytes).map_err(|e| {
            format!(
                "response is not an incident feed ('incidents' array expected): {}",
                e
            )
        })
    }
}
