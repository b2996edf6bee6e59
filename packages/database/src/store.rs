//! SQL store abstraction and its `DuckDB` implementation.

use std::path::PathBuf;
use std::time::Duration;

use duckdb::Connection;
use duckdb::types::{TimeUnit, Value};
use healthcare_chat_database_models::QueryOutput;

use crate::{DbError, guard, paths};

/// Default statement timeout in seconds.
const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 30;

/// Days from 0001-01-01 (CE) to 1970-01-01, for `DATE` conversion.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Anything that can run raw SQL and report column names and rows.
#[async_trait::async_trait]
pub trait QueryStore: Send + Sync {
    /// Runs `sql` as-is and returns its column names and rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection, the statement, or row
    /// decoding fails, or the statement times out.
    async fn query(&self, sql: &str) -> Result<QueryOutput, DbError>;
}

/// Configuration for [`DuckDbStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the `DuckDB` file.
    pub path: PathBuf,
    /// Upper bound on a single statement's wall-clock time.
    pub statement_timeout: Duration,
    /// Open connections read-only and refuse non-`SELECT` statements.
    pub read_only: bool,
}

impl StoreConfig {
    /// Creates a read-only configuration for `path` with the default
    /// timeout.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            statement_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS),
            read_only: true,
        }
    }

    /// Reads `DATABASE_PATH`, `QUERY_TIMEOUT_SECS` and `SQL_READ_ONLY`.
    #[must_use]
    pub fn from_env() -> Self {
        let timeout = std::env::var("QUERY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STATEMENT_TIMEOUT_SECS);
        let read_only = std::env::var("SQL_READ_ONLY")
            .ok()
            .is_none_or(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"));

        Self {
            path: paths::database_path_from_env(),
            statement_timeout: Duration::from_secs(timeout),
            read_only,
        }
    }
}

/// A [`QueryStore`] backed by a `DuckDB` file.
///
/// Holds no connection. Every [`QueryStore::query`] call opens its own
/// connection on a blocking thread and drops it before the task returns,
/// so the connection is released on success, error and panic alike.
#[derive(Debug, Clone)]
pub struct DuckDbStore {
    config: StoreConfig,
}

impl DuckDbStore {
    /// Creates a store for the given configuration.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl QueryStore for DuckDbStore {
    async fn query(&self, sql: &str) -> Result<QueryOutput, DbError> {
        if self.config.read_only {
            guard::ensure_read_only(sql)?;
        }

        let config = self.config.clone();
        let sql = sql.to_string();
        let timeout = self.config.statement_timeout;

        let conn = tokio::task::spawn_blocking(move || open_connection(&config))
            .await
            .map_err(|e| DbError::Task {
                message: e.to_string(),
            })??;
        let interrupt = conn.interrupt_handle();

        let task = tokio::task::spawn_blocking(move || run_query(&conn, &sql));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(DbError::Task {
                message: e.to_string(),
            }),
            Err(_) => {
                log::warn!(
                    "Statement exceeded {}s timeout; interrupting",
                    timeout.as_secs()
                );
                interrupt.interrupt();
                Err(DbError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        }
    }
}

/// Opens a connection according to `config`.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened (including a missing
/// file in read-only mode).
pub fn open_connection(config: &StoreConfig) -> Result<Connection, DbError> {
    if config.read_only {
        let flags = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
        Ok(Connection::open_with_flags(&config.path, flags)?)
    } else {
        if let Some(parent) = config.path.parent() {
            paths::ensure_dir(parent)?;
        }
        Ok(Connection::open(&config.path)?)
    }
}

/// Runs a single statement and collects every row as JSON values.
///
/// # Errors
///
/// Returns [`DbError`] if preparation, execution or row decoding fails.
pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryOutput, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    let columns: Vec<String> = rows
        .as_ref()
        .map(duckdb::Statement::column_names)
        .unwrap_or_default();

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value: Value = row.get(idx)?;
            values.push(value_to_json(value));
        }
        out.push(values);
    }

    Ok(QueryOutput { columns, rows: out })
}

/// Converts a `DuckDB` value to JSON.
///
/// Integers and floats become numbers, `DATE` becomes `YYYY-MM-DD`, and
/// anything without a natural JSON shape falls back to its debug text.
#[must_use]
pub fn value_to_json(value: Value) -> serde_json::Value {
    use serde_json::json;

    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => json!(b),
        Value::TinyInt(i) => json!(i),
        Value::SmallInt(i) => json!(i),
        Value::Int(i) => json!(i),
        Value::BigInt(i) => json!(i),
        Value::HugeInt(i) => i64::try_from(i).map_or_else(|_| json!(i.to_string()), |v| json!(v)),
        Value::UTinyInt(u) => json!(u),
        Value::USmallInt(u) => json!(u),
        Value::UInt(u) => json!(u),
        Value::UBigInt(u) => json!(u),
        Value::Float(f) => json!(f),
        Value::Double(f) => json!(f),
        Value::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>().map_or_else(|_| json!(text), |f| json!(f))
        }
        Value::Text(s) | Value::Enum(s) => serde_json::Value::String(s),
        Value::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(chrono::NaiveDate::from_num_days_from_ce_opt)
            .map_or(serde_json::Value::Null, |d| {
                json!(d.format("%Y-%m-%d").to_string())
            }),
        Value::Timestamp(unit, v) => chrono::DateTime::from_timestamp_micros(to_micros(unit, v))
            .map_or(serde_json::Value::Null, |ts| {
                json!(ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }),
        Value::Time64(unit, v) => time_of_day(to_micros(unit, v))
            .map_or(serde_json::Value::Null, |t| {
                json!(t.format("%H:%M:%S%.f").to_string())
            }),
        Value::Interval {
            months,
            days,
            nanos,
        } => json!(format_interval(months, days, nanos)),
        Value::List(items) | Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(value_to_json).collect())
        }
        Value::Union(inner) => value_to_json(*inner),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

/// Scales a `DuckDB` time value to microseconds.
const fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn time_of_day(micros: i64) -> Option<chrono::NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

/// Renders an interval the way `DuckDB` prints one, e.g.
/// `1 year 2 months 3 days 04:05:06`.
#[must_use]
pub fn format_interval(months: i32, days: i32, nanos: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        if n.abs() == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        parts.push(unit(i64::from(years), "year"));
    }
    if months != 0 {
        parts.push(unit(i64::from(months), "month"));
    }
    if days != 0 {
        parts.push(unit(i64::from(days), "day"));
    }

    if nanos != 0 || parts.is_empty() {
        let sign = if nanos < 0 { "-" } else { "" };
        let total = nanos.unsigned_abs();
        let secs = total / 1_000_000_000;
        let micros = (total % 1_000_000_000) / 1_000;
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if micros != 0 {
            let digits = format!("{micros:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}
