//! Table output formatting

use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::aggregate::AggregationTable;

/// Format the month x severity matrix as a table.
///
/// One row per month in chronological order, one column per severity label
/// (as written in the feed), plus a per-month total.
pub fn format_matrix(table: &AggregationTable) -> String {
    if table.is_empty() {
        return "No incidents found.".to_string();
    }

    let severities = table.severities();

    let mut builder = Builder::default();
    let mut header = vec!["MONTH".to_string()];
    header.extend(severities.iter().map(|label| label.to_string()));
    header.push("TOTAL".to_string());
    builder.push_record(header);

    for month in table.months() {
        let mut row = vec![month.to_string()];
        row.extend(
            severities
                .iter()
                .map(|label| table.count(month, label).to_string()),
        );
        row.push(table.month_total(month).to_string());
        builder.push_record(row);
    }

    let mut rendered = builder.build();
    rendered
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    rendered.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::client::RawIncident;

    fn incident(id: &str, created_at: &str, impact: &str) -> RawIncident {
        RawIncident {
            id: Some(id.to_string()),
            created_at: Some(created_at.to_string()),
            impact: Some(impact.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_matrix_empty() {
        assert_eq!(
            format_matrix(&AggregationTable::default()),
            "No incidents found."
        );
    }

    #[test]
    fn test_format_matrix_rows_and_columns() {
        let aggregation = aggregate::process(&[
            incident("1", "2025-01-03T10:00:00Z", "major"),
            incident("2", "2025-01-17T08:30:00Z", "minor"),
            incident("3", "2025-02-02T09:15:00Z", "critical"),
        ]);

        let result = format_matrix(&aggregation.table);

        assert!(result.contains("MONTH"));
        assert!(result.contains("critical"));
        assert!(result.contains("major"));
        assert!(result.contains("minor"));
        assert!(result.contains("TOTAL"));
        assert!(result.contains("2025-01"));
        assert!(result.contains("2025-02"));

        let january = result.find("2025-01").unwrap();
        let february = result.find("2025-02").unwrap();
        assert!(january < february);
    }

    #[test]
    fn test_format_matrix_keeps_case_distinct_labels() {
        let aggregation = aggregate::process(&[
            incident("1", "2025-01-03T10:00:00Z", "Major"),
            incident("2", "2025-01-04T10:00:00Z", "major"),
            incident("3", "2025-01-05T10:00:00Z", "major"),
        ]);

        let result = format_matrix(&aggregation.table);
        let header = result.lines().nth(1).unwrap();
        let cells: Vec<&str> = header
            .split('│')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        assert_eq!(cells, vec!["MONTH", "Major", "major", "TOTAL"]);

        let row = result.lines().find(|line| line.contains("2025-01")).unwrap();
        let cells: Vec<&str> = row
            .split('│')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        assert_eq!(cells, vec!["2025-01", "1", "2", "3"]);
    }

    #[test]
    fn test_format_matrix_uses_rounded_style() {
        let aggregation = aggregate::process(&[incident("1", "2025-01-03T10:00:00Z", "minor")]);
        let result = format_matrix(&aggregation.table);

        // Rounded style uses ╭ for top-left corner
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }
}
