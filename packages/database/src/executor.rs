//! Query execution and result shaping.
//!
//! [`QueryExecutor::execute`] is total: every failure, from a syntax error
//! to a timeout, comes back as [`ExecutionResult::Error`] with a
//! [`EXECUTION_FAILED_PREFIX`] message instead of an `Err`.

use std::sync::Arc;

use healthcare_chat_database_models::{AggregateDetection, ExecutionResult, QueryOutput};

use crate::store::QueryStore;

/// Payload returned when a non-aggregate query matches nothing.
pub const NO_MATCHING_RECORDS: &str = "No matching records found.";

/// Prefix of every execution failure message.
pub const EXECUTION_FAILED_PREFIX: &str = "Query execution failed: ";

/// Builds the aggregate count sentence for the first cell of a result.
#[must_use]
pub fn count_sentence(value: &serde_json::Value) -> String {
    let rendered = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("There are {rendered} matching records.")
}

/// Runs synthesized SQL against a [`QueryStore`] and shapes the outcome.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn QueryStore>,
    detection: AggregateDetection,
}

impl QueryExecutor {
    /// Creates an executor using the default [`AggregateDetection`].
    #[must_use]
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self {
            store,
            detection: AggregateDetection::default(),
        }
    }

    /// Sets how aggregate count queries are recognized.
    #[must_use]
    pub const fn with_detection(mut self, detection: AggregateDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Returns the aggregate detection mode.
    #[must_use]
    pub const fn detection(&self) -> AggregateDetection {
        self.detection
    }

    /// Executes `sql` verbatim and shapes the result.
    ///
    /// - aggregate count with at least one row → count sentence built from
    ///   the first column of the first row
    /// - no rows → [`NO_MATCHING_RECORDS`]
    /// - otherwise → one record per row
    pub async fn execute(&self, sql: &str) -> ExecutionResult {
        log::debug!("Executing SQL: {sql}");

        match self.store.query(sql).await {
            Ok(output) => {
                let result = shape(sql, output, self.detection);
                log::debug!("Execution succeeded: {}", summarize(&result));
                result
            }
            Err(e) => {
                log::warn!("Query execution failed: {e}");
                ExecutionResult::error(format!("{EXECUTION_FAILED_PREFIX}{e}"))
            }
        }
    }
}

/// Whether `sql`/`output` should collapse to a count sentence.
fn is_aggregate(sql: &str, output: &QueryOutput, detection: AggregateDetection) -> bool {
    match detection {
        AggregateDetection::Substring => sql.to_uppercase().contains("COUNT"),
        AggregateDetection::SingleValue => output.rows.len() == 1 && output.columns.len() == 1,
    }
}

/// Shapes raw store output into an [`ExecutionResult`].
#[must_use]
pub fn shape(sql: &str, output: QueryOutput, detection: AggregateDetection) -> ExecutionResult {
    if is_aggregate(sql, &output, detection)
        && let Some(first) = output.rows.first().and_then(|row| row.first())
    {
        return ExecutionResult::message(count_sentence(first));
    }

    if output.rows.is_empty() {
        return ExecutionResult::message(NO_MATCHING_RECORDS);
    }

    ExecutionResult::records(output.into_records())
}

fn summarize(result: &ExecutionResult) -> String {
    match result {
        ExecutionResult::Success {
            data: healthcare_chat_database_models::ExecutionPayload::Records(records),
        } => format!("{} record(s)", records.len()),
        other => other.render(),
    }
}
