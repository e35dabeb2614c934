//! Output formatting for CLI results

use crate::aggregate::Aggregation;
use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod table;

pub use json::{JsonOutput, SourceMetadata};

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// An aggregation together with the provenance of its payload
#[derive(Debug)]
pub struct Report {
    pub aggregation: Aggregation,
    pub source: SourceMetadata,
}

impl Formattable for Report {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(table::format_matrix(&self.aggregation.table)),
            OutputFormat::Json => Ok(JsonOutput::new(&self.aggregation.table)
                .with_source(self.source.clone())
                .with_diagnostics(self.aggregation.diagnostics.clone())
                .to_pretty()?),
        }
    }
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::cache::Origin;

    fn report() -> Report {
        let body = br#"{"incidents": [
            {"id": "1", "created_at": "2025-01-03T10:00:00Z", "impact": "major"},
            {"id": "2", "created_at": "2025-02-02T09:15:00Z", "impact": "critical"},
            {"id": "3", "impact": "minor"}
        ]}"#;
        Report {
            aggregation: aggregate::process_payload(body).unwrap(),
            source: SourceMetadata::new("http://status", &Origin::Remote),
        }
    }

    #[test]
    fn test_report_as_json_carries_dense_matrix() {
        let rendered = report().format(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["data"]["2025-01"]["major"], 1);
        assert_eq!(value["data"]["2025-01"]["critical"], 0);
        assert_eq!(value["data"]["2025-02"]["critical"], 1);
        assert_eq!(value["meta"]["diagnostics"]["skipped"]["missing_created_at"], 1);
    }

    #[test]
    fn test_report_as_table() {
        let rendered = report().format(OutputFormat::Table).unwrap();
        assert!(rendered.contains("major"));
        assert!(rendered.contains("2025-02"));
    }
}
