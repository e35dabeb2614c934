//! JSON output formatting

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::Diagnostics;
use crate::cache::Origin;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    /// The actual data
    pub data: T,

    /// Metadata about the response
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// Timestamp of the response
    pub timestamp: String,

    /// CLI version
    pub version: String,

    /// Where the incident payload came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,

    /// Accepted and skipped record counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// Provenance of the payload behind a report
#[derive(Debug, Clone, Serialize)]
pub struct SourceMetadata {
    pub url: String,

    /// `remote`, `cache` or `stale_cache`
    pub origin: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,

    pub stale: bool,

    /// Why the refresh failed, for stale payloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceMetadata {
    pub fn new(url: impl Into<String>, origin: &Origin) -> Self {
        let url = url.into();
        match origin {
            Origin::Remote => Self {
                url,
                origin: "remote",
                stored_at: None,
                stale: false,
                error: None,
            },
            Origin::Cache { stored_at } => Self {
                url,
                origin: "cache",
                stored_at: Some(*stored_at),
                stale: false,
                error: None,
            },
            Origin::StaleCache { stored_at, error } => Self {
                url,
                origin: "stale_cache",
                stored_at: Some(*stored_at),
                stale: true,
                error: Some(error.to_string()),
            },
        }
    }
}

impl<T> JsonOutput<T> {
    /// Create a new JSON output with metadata
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                source: None,
                diagnostics: None,
            },
        }
    }

    pub fn with_source(mut self, source: SourceMetadata) -> Self {
        self.meta.source = Some(source);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.meta.diagnostics = Some(diagnostics);
        self
    }
}

impl<T: Serialize> JsonOutput<T> {
    /// Serialize as pretty-printed JSON
    pub fn to_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    JsonOutput::new(data).to_pretty()
}
