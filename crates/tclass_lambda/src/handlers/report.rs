use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::Message;
use serde_json::json;
use tclass_core::contract::QueryResultRow;
use tclass_core::report::{compute_totals, report_file_name, rows_to_csv, zip_report, ReportTotals};

use crate::adapters::mailer::ReportSender;

pub const REPORT_SUBJECT: &str = "DynamoDB Table Class Optimizer Report";

/// Where the report goes. Resolved from environment configuration at
/// publish time and passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub sender: String,
    pub recipients: Vec<String>,
}

impl ReportConfig {
    pub fn new(
        sender: impl Into<String>,
        comma_separated_recipients: &str,
    ) -> Result<Self, String> {
        let sender = sender.into();
        if sender.trim().is_empty() {
            return Err("Report sender address cannot be empty".to_string());
        }

        let recipients: Vec<String> = comma_separated_recipients
            .split(',')
            .map(str::trim)
            .filter(|recipient| !recipient.is_empty())
            .map(str::to_string)
            .collect();
        if recipients.is_empty() {
            return Err("Report recipient list cannot be empty".to_string());
        }

        Ok(Self { sender, recipients })
    }
}

/// Serializes the processed rows, archives them, composes the two-part
/// message, and hands it to the notification channel. Send failure is fatal.
pub fn publish_report(
    rows: &[QueryResultRow],
    dry_run: bool,
    config: &ReportConfig,
    sender: &dyn ReportSender,
) -> Result<ReportTotals, String> {
    let totals = compute_totals(rows);
    let csv_bytes = rows_to_csv(rows).map_err(|error| error.message().to_string())?;
    let file_name = report_file_name(Utc::now());
    let archive = zip_report(&file_name, &csv_bytes).map_err(|error| error.message().to_string())?;
    let raw_message = compose_report_email(config, &totals, dry_run, &file_name, archive)?;

    sender.send_raw(&config.sender, &config.recipients, &raw_message)?;

    log_report_info(
        "report_published",
        json!({
            "file_name": file_name,
            "table_count": totals.table_count,
            "potential_savings_per_month": totals.potential_savings_per_month,
            "recipient_count": config.recipients.len(),
            "dry_run": dry_run,
        }),
    );
    Ok(totals)
}

/// Builds the raw MIME message: plain-text and HTML summaries plus the
/// zipped CSV attachment.
pub fn compose_report_email(
    config: &ReportConfig,
    totals: &ReportTotals,
    dry_run: bool,
    file_name: &str,
    archive: Vec<u8>,
) -> Result<Vec<u8>, String> {
    let mode_line = if dry_run {
        "Mode: dry run - no tables were modified."
    } else {
        "Mode: live update."
    };
    let text_body = format!(
        "Tables processed: {}\nPotential savings per month: ${}\n{mode_line}\nThe full report is attached.\n",
        totals.table_count, totals.potential_savings_per_month,
    );
    let html_body = format!(
        "<html><body><h2>{REPORT_SUBJECT}</h2>\
         <ul><li>Tables processed: {}</li>\
         <li>Potential savings per month: ${}</li></ul>\
         <p>{mode_line}</p><p>The full report is attached.</p></body></html>",
        totals.table_count, totals.potential_savings_per_month,
    );

    let from = config
        .sender
        .parse::<Mailbox>()
        .map_err(|error| format!("Invalid sender address '{}': {error}", config.sender))?;
    let mut builder = Message::builder().from(from).subject(REPORT_SUBJECT);
    for recipient in &config.recipients {
        let mailbox = recipient
            .parse::<Mailbox>()
            .map_err(|error| format!("Invalid recipient address '{recipient}': {error}"))?;
        builder = builder.to(mailbox);
    }

    let content_type = ContentType::parse("application/zip")
        .map_err(|error| format!("Invalid attachment content type: {error}"))?;
    let attachment = Attachment::new(format!("{file_name}.zip")).body(archive, content_type);

    let message = builder
        .multipart(
            MultiPart::mixed()
                .multipart(MultiPart::alternative_plain_html(text_body, html_body))
                .singlepart(attachment),
        )
        .map_err(|error| format!("Failed to compose report email: {error}"))?;
    Ok(message.formatted())
}

fn log_report_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "report_publisher",
            "event": event,
            "timestamp": Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
