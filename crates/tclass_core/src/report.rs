use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::contract::QueryResultRow;

/// Report column order: the row schema field names in declaration order.
pub const REPORT_HEADER: [&str; 7] = [
    "region",
    "account_id",
    "table_name",
    "recommendation",
    "potential_savings_per_month",
    "update_result",
    "updated",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub table_count: usize,
    pub potential_savings_per_month: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportError {
    message: String,
}

impl ReportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ReportError {}

pub fn compute_totals(rows: &[QueryResultRow]) -> ReportTotals {
    ReportTotals {
        table_count: rows.len(),
        potential_savings_per_month: rows
            .iter()
            .map(|row| row.potential_savings_per_month)
            .sum(),
    }
}

/// Report CSV name, timestamped to the second. The spelling is historical.
pub fn report_file_name(timestamp: DateTime<Utc>) -> String {
    format!(
        "DDB_Table_Classs_Report_{}.csv",
        timestamp.format("%Y-%m-%dT%H:%M:%S")
    )
}

/// Serializes processed rows into CSV bytes with the fixed report header.
pub fn rows_to_csv(rows: &[QueryResultRow]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(REPORT_HEADER)
        .map_err(|error| ReportError::new(format!("Failed to write report header: {error}")))?;

    for row in rows {
        // Every row reaching the report stage must carry an update result.
        let update_result = row.update_result.as_deref().ok_or_else(|| {
            ReportError::new(format!(
                "Row for table '{}' reached the report without an update result",
                row.table_name
            ))
        })?;
        writer
            .write_record([
                row.region.as_str(),
                row.account_id.as_str(),
                row.table_name.as_str(),
                row.recommendation.as_str(),
                &row.potential_savings_per_month.to_string(),
                update_result,
                &row.updated.to_string(),
            ])
            .map_err(|error| ReportError::new(format!("Failed to write report row: {error}")))?;
    }

    writer
        .into_inner()
        .map_err(|error| ReportError::new(format!("Failed to finish report CSV: {error}")))
}

/// Wraps the CSV into a single-entry deflate ZIP archive.
pub fn zip_report(file_name: &str, csv_bytes: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    archive
        .start_file(file_name, options)
        .map_err(|error| ReportError::new(format!("Failed to start report archive entry: {error}")))?;
    archive
        .write_all(csv_bytes)
        .map_err(|error| ReportError::new(format!("Failed to write report archive entry: {error}")))?;

    let cursor = archive
        .finish()
        .map_err(|error| ReportError::new(format!("Failed to finish report archive: {error}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn processed_row(table_name: &str, savings: i64, update_result: &str, updated: bool) -> QueryResultRow {
        QueryResultRow {
            region: "us-east-1".to_string(),
            account_id: "111".to_string(),
            table_name: table_name.to_string(),
            recommendation: "STANDARD_INFREQUENT_ACCESS".to_string(),
            potential_savings_per_month: savings,
            update_result: Some(update_result.to_string()),
            updated,
        }
    }

    #[test]
    fn totals_sum_row_count_and_savings() {
        let rows = vec![
            processed_row("orders", 12, "ACTIVE", true),
            processed_row("sessions", 30, "Dry Run - Did not update", false),
        ];

        let totals = compute_totals(&rows);

        assert_eq!(totals.table_count, 2);
        assert_eq!(totals.potential_savings_per_month, 42);
    }

    #[test]
    fn file_name_is_timestamped_to_the_second() {
        let timestamp = Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 5).unwrap();

        assert_eq!(
            report_file_name(timestamp),
            "DDB_Table_Classs_Report_2026-02-14T09:30:05.csv"
        );
    }

    #[test]
    fn csv_starts_with_the_schema_header_and_keeps_every_row() {
        let rows = vec![
            processed_row("orders", 12, "ACTIVE", true),
            processed_row("sessions", 30, "ValidationException: table busy", false),
        ];

        let bytes = rows_to_csv(&rows).expect("report should serialize");
        let text = String::from_utf8(bytes).expect("report should be utf-8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "region,account_id,table_name,recommendation,potential_savings_per_month,update_result,updated"
        );
        assert_eq!(lines.len(), 1 + rows.len());
        assert!(lines[1].contains("orders"));
        assert!(lines[2].contains("ValidationException: table busy"));
    }

    #[test]
    fn rejects_a_row_without_an_update_result() {
        let mut row = processed_row("orders", 12, "ACTIVE", true);
        row.update_result = None;

        let error = rows_to_csv(&[row]).expect_err("unprocessed row should fail");

        assert!(error.message().contains("without an update result"));
        assert!(error.message().contains("orders"));
    }

    #[test]
    fn zip_report_produces_a_non_empty_archive() {
        let csv_bytes = rows_to_csv(&[processed_row("orders", 12, "ACTIVE", true)])
            .expect("report should serialize");

        let archive = zip_report("DDB_Table_Classs_Report_test.csv", &csv_bytes)
            .expect("archive should build");

        // Local file header magic for the first entry.
        assert_eq!(&archive[..4], b"PK\x03\x04");
        assert!(archive.len() > 4);
    }
}
