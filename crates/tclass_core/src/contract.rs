use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UPDATE_RESULT_DRY_RUN: &str = "Dry Run - Did not update";
pub const UPDATE_RESULT_ALREADY_OPTIMIZED: &str = "Already Optimized - Did not update";

/// Grouping key for one target management-API scope. Value equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRegionPair {
    pub account_id: String,
    pub region: String,
}

/// One recommendation row from the analytic query result set.
///
/// `recommendation` starts as the raw free-text value from the source and is
/// rewritten in place to its normalized token during processing.
/// `update_result` and `updated` are populated exactly once in the update
/// phase; every row reaching the report stage carries a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResultRow {
    pub region: String,
    pub account_id: String,
    pub table_name: String,
    pub recommendation: String,
    pub potential_savings_per_month: i64,
    #[serde(default)]
    pub update_result: Option<String>,
    #[serde(default)]
    pub updated: bool,
}

impl QueryResultRow {
    pub fn account_and_region(&self) -> AccountRegionPair {
        AccountRegionPair {
            account_id: self.account_id.clone(),
            region: self.region.clone(),
        }
    }
}

/// Validated invocation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerRequest {
    pub query_execution_id: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Parses the raw invocation payload.
///
/// `QueryExecutionId` must be a string. `IsDryRun` is read as a boolean;
/// an absent or non-boolean value falls back to `false`.
pub fn parse_optimizer_event(event: &Value) -> Result<OptimizerRequest, ValidationError> {
    let Some(object) = event.as_object() else {
        return Err(ValidationError::new(
            "Invocation payload must be a JSON object",
        ));
    };

    let query_execution_id = match object.get("QueryExecutionId") {
        Some(Value::String(value)) => {
            if value.trim().is_empty() {
                return Err(ValidationError::new("QueryExecutionId cannot be empty"));
            }
            value.clone()
        }
        Some(_) => {
            return Err(ValidationError::new("QueryExecutionId must be a string"));
        }
        None => {
            return Err(ValidationError::new("QueryExecutionId is required"));
        }
    };

    let dry_run = object
        .get("IsDryRun")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(OptimizerRequest {
        query_execution_id,
        dry_run,
    })
}
