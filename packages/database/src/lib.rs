#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` store, query executor, and dashboard aggregates.
//!
//! The [`store::QueryStore`] trait is the only thing the natural-language
//! pipeline knows about the database: SQL text in, column names and rows
//! out. [`store::DuckDbStore`] implements it by opening a fresh connection
//! per call inside a blocking task bounded by a statement timeout.
//! [`executor::QueryExecutor`] turns raw output (or a failure) into an
//! [`healthcare_chat_database_models::ExecutionResult`].

pub mod aggregates;
pub mod executor;
pub mod guard;
pub mod paths;
pub mod store;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` reported an error (syntax, missing object, I/O, ...).
    #[error("{0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The statement did not finish within the configured timeout.
    #[error("statement timed out after {seconds}s")]
    Timeout {
        /// The configured timeout.
        seconds: u64,
    },

    /// The read-only guard refused the statement.
    #[error("statement rejected: {reason}")]
    Rejected {
        /// Why the statement was refused.
        reason: String,
    },

    /// The blocking task running the statement panicked or was cancelled.
    #[error("query task failed: {message}")]
    Task {
        /// Description from the join error.
        message: String,
    },
}
