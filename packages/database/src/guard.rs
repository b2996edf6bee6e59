//! Read-only statement guard for model-generated SQL.
//!
//! Generated SQL is untrusted text. When the guard is enabled the store
//! refuses anything whose first keyword (after comments, whitespace and
//! opening parentheses) is not `SELECT` or `WITH`, and additionally opens
//! `DuckDB` in read-only access mode so a write hidden behind a CTE still
//! fails at the engine.

use std::sync::LazyLock;

use regex::Regex;

use crate::DbError;

/// Keywords a read-only statement may start with.
const ALLOWED_KEYWORDS: &[&str] = &["SELECT", "WITH"];

/// Captures the first SQL keyword, skipping whitespace, `--` line comments,
/// `/* */` block comments and opening parentheses.
static LEADING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:\s+|--[^\n]*(?:\n|$)|/\*.*?\*/|\()*([A-Za-z_]+)")
        .unwrap_or_else(|_| unreachable!())
});

/// Returns the upper-cased first keyword of `sql`, if any.
#[must_use]
pub fn leading_keyword(sql: &str) -> Option<String> {
    LEADING_KEYWORD
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Checks that `sql` looks like a read-only query.
///
/// # Errors
///
/// Returns [`DbError::Rejected`] if the statement is empty or starts with a
/// keyword other than `SELECT`/`WITH`.
pub fn ensure_read_only(sql: &str) -> Result<(), DbError> {
    match leading_keyword(sql) {
        Some(keyword) if ALLOWED_KEYWORDS.contains(&keyword.as_str()) => Ok(()),
        Some(keyword) => Err(DbError::Rejected {
            reason: format!("only SELECT queries are allowed, got {keyword}"),
        }),
        None => Err(DbError::Rejected {
            reason: "no SQL statement found".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_select_and_cte() {
        assert!(ensure_read_only("SELECT COUNT(*) FROM healthcare_data").is_ok());
        assert!(ensure_read_only("  select * from healthcare_data").is_ok());
        assert!(ensure_read_only("WITH m AS (SELECT 1) SELECT * FROM m").is_ok());
        assert!(ensure_read_only("(SELECT 1) UNION (SELECT 2)").is_ok());
    }

    #[test]
    fn skips_leading_comments() {
        let sql = "-- generated\n/* multi\nline */ SELECT Name FROM healthcare_data";
        assert_eq!(leading_keyword(sql).as_deref(), Some("SELECT"));
        assert!(ensure_read_only(sql).is_ok());
    }

    #[test]
    fn rejects_writes() {
        for sql in [
            "DELETE FROM healthcare_data",
            "DROP TABLE healthcare_data",
            "update healthcare_data set Age = 0",
            "INSERT INTO healthcare_data VALUES (1)",
        ] {
            let err = ensure_read_only(sql).unwrap_err();
            assert!(matches!(err, DbError::Rejected { .. }), "{sql}");
        }
    }

    #[test]
    fn rejects_non_sql_text() {
        assert!(ensure_read_only("").is_err());
        assert!(ensure_read_only("   ").is_err());
        let err = ensure_read_only("Error generating SQL query: timeout").unwrap_err();
        assert_eq!(
            err.to_string(),
            "statement rejected: only SELECT queries are allowed, got ERROR"
        );
    }
}
