use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tclass_core::contract::{
    parse_optimizer_event, QueryResultRow, UPDATE_RESULT_ALREADY_OPTIMIZED, UPDATE_RESULT_DRY_RUN,
};
use tclass_core::grouping::RowGroups;
use tclass_core::recommendation::normalize_recommendation;
use tclass_core::results::RowAssembler;

use crate::adapters::credentials::{TableApiBroker, TableClassApi};
use crate::adapters::mailer::ReportSender;
use crate::adapters::results::QueryResultSource;
use crate::handlers::report::{publish_report, ReportConfig};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptimizerResponse {
    pub query_execution_id: String,
    pub dry_run: bool,
    pub tables_processed: usize,
    pub potential_savings_per_month: i64,
    pub status: String,
    pub rows: Vec<QueryResultRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerError {
    pub message: String,
}

impl OptimizerError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Runs one optimizer pass: read the query result, group it by account and
/// region, apply the per-table decision policy with one scoped client per
/// group, then publish the report.
///
/// Malformed payloads, malformed result pages, unrecognized
/// recommendations, credential-exchange failures, and send failures abort
/// the run. Describe/update errors are captured per row and processing
/// continues.
pub fn handle_optimizer_event(
    event: &Value,
    results: &dyn QueryResultSource,
    broker: &dyn TableApiBroker,
    report_sender: &dyn ReportSender,
    report_config: &ReportConfig,
) -> Result<OptimizerResponse, OptimizerError> {
    let started_at = Instant::now();
    let request = parse_optimizer_event(event)
        .map_err(|error| OptimizerError::new(error.message().to_string()))?;

    log_optimizer_info(
        "run_started",
        json!({
            "query_execution_id": request.query_execution_id.clone(),
            "dry_run": request.dry_run,
        }),
    );

    let mut assembler = RowAssembler::new();
    let mut groups = RowGroups::new();
    results
        .for_each_page(&request.query_execution_id, &mut |page| {
            let rows = assembler
                .rows_from_page(&page)
                .map_err(|error| error.message().to_string())?;
            for row in rows {
                groups.push(row);
            }
            Ok(())
        })
        .map_err(OptimizerError::new)?;

    let group_count = groups.len();
    let mut processed_rows = Vec::new();
    for group in groups.into_groups() {
        log_optimizer_info(
            "group_started",
            json!({
                "account_id": group.key.account_id.clone(),
                "region": group.key.region.clone(),
                "table_count": group.rows.len(),
            }),
        );

        let client = broker
            .client_for(&group.key.account_id, &group.key.region)
            .map_err(OptimizerError::new)?;
        for row in group.rows {
            processed_rows.push(process_row(client.as_ref(), row, request.dry_run)?);
        }
    }

    let totals = publish_report(
        &processed_rows,
        request.dry_run,
        report_config,
        report_sender,
    )
    .map_err(OptimizerError::new)?;

    log_optimizer_info(
        "run_completed",
        json!({
            "query_execution_id": request.query_execution_id.clone(),
            "group_count": group_count,
            "tables_processed": totals.table_count,
            "tables_updated": processed_rows.iter().filter(|row| row.updated).count(),
            "duration_ms": started_at.elapsed().as_millis(),
        }),
    );

    Ok(OptimizerResponse {
        query_execution_id: request.query_execution_id,
        dry_run: request.dry_run,
        tables_processed: totals.table_count,
        potential_savings_per_month: totals.potential_savings_per_month,
        status: "report_sent".to_string(),
        rows: processed_rows,
    })
}

/// Applies the decision policy to one row: at most one describe and one
/// update call. The row always comes back with an update result.
fn process_row(
    client: &dyn TableClassApi,
    mut row: QueryResultRow,
    dry_run: bool,
) -> Result<QueryResultRow, OptimizerError> {
    let target = normalize_recommendation(&row.recommendation)
        .map_err(|error| OptimizerError::new(error.message().to_string()))?;
    row.recommendation = target.as_str().to_string();

    log_optimizer_info(
        "table_update_started",
        json!({
            "account_id": row.account_id.clone(),
            "region": row.region.clone(),
            "table_name": row.table_name.clone(),
            "table_class": target.as_str(),
            "dry_run": dry_run,
        }),
    );

    match client.describe_table_class(&row.table_name) {
        Err(message) => row.update_result = Some(message),
        Ok(current) if current == target.as_str() => {
            row.update_result = Some(UPDATE_RESULT_ALREADY_OPTIMIZED.to_string());
        }
        Ok(_) if dry_run => row.update_result = Some(UPDATE_RESULT_DRY_RUN.to_string()),
        Ok(_) => match client.update_table_class(&row.table_name, target.as_str()) {
            Ok(status) => {
                row.updated = true;
                row.update_result = Some(status);
            }
            Err(message) => {
                log_optimizer_error(
                    "table_update_failed",
                    json!({
                        "table_name": row.table_name.clone(),
                        "error": message.clone(),
                    }),
                );
                row.update_result = Some(message);
            }
        },
    }

    Ok(row)
}

fn log_optimizer_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "optimizer_handler",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_optimizer_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "optimizer_handler",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
