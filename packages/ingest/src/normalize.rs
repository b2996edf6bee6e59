//! Cleaning of raw CSV cells into typed column values.

use chrono::{NaiveDate, NaiveDateTime};
use healthcare_chat_patient_models::{PatientColumn, SqlType};

/// Input date layouts tried in order. Month-first wins over day-first for
/// ambiguous slash dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// A cleaned value ready to bind into an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// `INTEGER` columns.
    Integer(i64),
    /// `DOUBLE` columns.
    Double(f64),
    /// Non-empty text.
    Text(String),
    /// Missing, empty or unparseable.
    Null,
}

impl duckdb::ToSql for Cell {
    fn to_sql(&self) -> duckdb::Result<duckdb::types::ToSqlOutput<'_>> {
        use duckdb::types::{ToSqlOutput, Value};

        Ok(ToSqlOutput::Owned(match self {
            Self::Integer(v) => Value::BigInt(*v),
            Self::Double(v) => Value::Double(*v),
            Self::Text(v) => Value::Text(v.clone()),
            Self::Null => Value::Null,
        }))
    }
}

/// Parses an age. Fractional values are truncated; anything unparseable is
/// `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_age(raw: &str) -> i64 {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        })
        .unwrap_or(0)
}

/// Parses a billing amount; anything unparseable is `0.0`.
#[must_use]
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Normalizes a date to `YYYY-MM-DD`, or `None` if it cannot be parsed.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn is_date(column: PatientColumn) -> bool {
    matches!(
        column,
        PatientColumn::DateOfAdmission | PatientColumn::DischargeDate
    )
}

/// Cleans one raw cell for `column`.
///
/// Returns the cell and whether a non-empty date had to be dropped.
#[must_use]
pub fn clean(column: PatientColumn, raw: &str) -> (Cell, bool) {
    if is_date(column) {
        return normalize_date(raw).map_or_else(
            || (Cell::Null, !raw.trim().is_empty()),
            |date| (Cell::Text(date), false),
        );
    }

    let cell = match column.sql_type() {
        SqlType::Integer => Cell::Integer(parse_age(raw)),
        SqlType::Double => Cell::Double(parse_amount(raw)),
        SqlType::Text if raw.is_empty() => Cell::Null,
        SqlType::Text => Cell::Text(raw.to_string()),
    };
    (cell, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ages_are_coerced() {
        assert_eq!(parse_age("30"), 30);
        assert_eq!(parse_age(" 62 "), 62);
        assert_eq!(parse_age("45.9"), 45);
        assert_eq!(parse_age("unknown"), 0);
        assert_eq!(parse_age(""), 0);
    }

    #[test]
    fn amounts_are_coerced() {
        assert!((parse_amount("18856.281305978155") - 18_856.281_305_978_155).abs() < 1e-9);
        assert!(parse_amount("n/a").abs() < f64::EPSILON);
        assert!(parse_amount("NaN").abs() < f64::EPSILON);
    }

    #[test]
    fn dates_are_normalized() {
        assert_eq!(normalize_date("2024-01-31").as_deref(), Some("2024-01-31"));
        assert_eq!(normalize_date("01/31/2024").as_deref(), Some("2024-01-31"));
        assert_eq!(normalize_date("2024/1/5").as_deref(), Some("2024-01-05"));
        assert_eq!(
            normalize_date("2024-01-31 08:15:00").as_deref(),
            Some("2024-01-31")
        );
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn clean_flags_dropped_dates_only() {
        assert_eq!(
            clean(PatientColumn::DischargeDate, "not a date"),
            (Cell::Null, true)
        );
        assert_eq!(clean(PatientColumn::DischargeDate, ""), (Cell::Null, false));
        assert_eq!(
            clean(PatientColumn::Gender, "Female"),
            (Cell::Text("Female".to_string()), false)
        );
        assert_eq!(clean(PatientColumn::Doctor, ""), (Cell::Null, false));
    }
}
