#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Query result and execution payload types.
//!
//! [`QueryOutput`] is what the store hands back for a raw SQL statement.
//! [`ExecutionResult`] is the shaped, always-present outcome the query
//! executor produces from it, and is what the response summarizer reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single result row keyed by column name, in projection order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Category label → row count.
pub type CountMap = BTreeMap<String, i64>;

/// Outer label → inner label → row count.
pub type NestedCountMap = BTreeMap<String, CountMap>;

/// Raw output of a SQL statement: column names from the result descriptor
/// and the rows in the order the store returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    /// Column names as reported by the executed statement.
    pub columns: Vec<String>,
    /// Row values, each the same length as `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryOutput {
    /// Zips every row with the column list into a [`Record`].
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}

/// Success payload of a query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionPayload {
    /// A sentence: the aggregate count sentence or the no-records sentence.
    Message(String),
    /// Shaped result rows.
    Records(Vec<Record>),
}

/// Outcome of executing synthesized SQL. Never an `Err`: failures are a
/// variant like any other.
///
/// Serializes as `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionResult {
    /// The statement ran.
    Success {
        /// Shaped payload.
        data: ExecutionPayload,
    },
    /// The statement could not be run.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl ExecutionResult {
    /// Creates a success result carrying a sentence.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::Success {
            data: ExecutionPayload::Message(text.into()),
        }
    }

    /// Creates a success result carrying records.
    #[must_use]
    pub const fn records(records: Vec<Record>) -> Self {
        Self::Success {
            data: ExecutionPayload::Records(records),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this is the `error` variant.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Renders the payload as plain text for a prompt.
    ///
    /// Sentences and error messages are returned as-is; records are
    /// rendered as a compact JSON array.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Success {
                data: ExecutionPayload::Message(text),
            }
            | Self::Error { message: text } => text.clone(),
            Self::Success {
                data: ExecutionPayload::Records(records),
            } => serde_json::to_string(records).unwrap_or_default(),
        }
    }
}

/// How the executor decides that a statement is an aggregate count whose
/// answer should collapse to a single sentence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AggregateDetection {
    /// The upper-cased SQL text contains `COUNT`.
    ///
    /// A text sniff: it also fires on aliases or literals that merely
    /// mention "count".
    #[default]
    Substring,
    /// The result has exactly one row and one column.
    SingleValue,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use serde_json::json;

    use super::*;

    #[test]
    fn zips_rows_with_columns_in_order() {
        let output = QueryOutput {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![vec![json!(1), json!("A")], vec![json!(2), json!("B")]],
        };
        let records = output.into_records();
        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            json!([{"id": 1, "name": "A"}, {"id": 2, "name": "B"}])
        );
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["id", "name"]);
    }

    #[test]
    fn serializes_tagged_status() {
        let ok = ExecutionResult::message("No matching records found.");
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "data": "No matching records found."})
        );

        let err = ExecutionResult::error("Query execution failed: boom");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "message": "Query execution failed: boom"})
        );
    }

    #[test]
    fn renders_each_payload_shape() {
        assert_eq!(
            ExecutionResult::message("There are 3 matching records.").render(),
            "There are 3 matching records."
        );
        assert_eq!(ExecutionResult::error("bad").render(), "bad");

        let mut record = Record::new();
        record.insert("Name".to_string(), json!("Ann"));
        assert_eq!(
            ExecutionResult::records(vec![record]).render(),
            r#"[{"Name":"Ann"}]"#
        );
    }

    #[test]
    fn parses_aggregate_detection() {
        assert_eq!(
            AggregateDetection::from_str("substring").unwrap(),
            AggregateDetection::Substring
        );
        assert_eq!(
            AggregateDetection::from_str("Single-Value").unwrap(),
            AggregateDetection::SingleValue
        );
        assert!(AggregateDetection::from_str("parser").is_err());
    }
}
