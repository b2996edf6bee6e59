#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the healthcare CSV export into the `DuckDB` store.
//!
//! The load replaces `healthcare_data` wholesale: headers are mapped onto
//! the patient columns, cells are cleaned (see [`normalize`]), and rows are
//! inserted in transactions of [`CHUNK_SIZE`].

pub mod interactive;
pub mod normalize;
pub mod progress;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use healthcare_chat_database::DbError;
use healthcare_chat_database::store::{StoreConfig, open_connection};
use healthcare_chat_patient_models::{PatientColumn, TABLE_NAME, create_table_sql_named};
use thiserror::Error;

use crate::normalize::{Cell, clean};
use crate::progress::ProgressCallback;

/// Rows inserted per transaction.
pub const CHUNK_SIZE: usize = 5_000;

/// Table the load writes to before it replaces [`TABLE_NAME`].
const STAGING_TABLE: &str = "healthcare_data_staging";

/// Errors that can occur while loading or verifying data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The CSV could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Opening the store failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// A statement against the store failed.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// The same ID appears on more than one row.
    #[error("Duplicate ID {id} in CSV")]
    DuplicateId {
        /// The repeated ID.
        id: i64,
    },

    /// The table has not been loaded.
    #[error("Table {table} does not exist; run a load first")]
    MissingTable {
        /// Expected table name.
        table: &'static str,
    },
}

/// Outcome of [`load_csv`].
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Rows inserted.
    pub rows_loaded: u64,
    /// Patient columns with no matching CSV header; loaded as `NULL`.
    pub missing_columns: Vec<PatientColumn>,
    /// CSV headers that match no patient column; skipped.
    pub ignored_headers: Vec<String>,
    /// Non-empty dates that could not be parsed and were stored as `NULL`.
    pub dropped_dates: u64,
    /// Whether IDs were generated because the CSV has no ID column.
    pub generated_ids: bool,
    /// Rows whose ID was missing or unparseable and was assigned after the
    /// largest ID in the file.
    pub assigned_ids: u64,
    /// Wall-clock time of the load.
    pub duration: Duration,
}

/// Outcome of [`verify`].
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Rows in `healthcare_data`.
    pub row_count: u64,
    /// Patient columns absent from the table.
    pub missing_columns: Vec<PatientColumn>,
}

impl VerifyReport {
    /// Whether every patient column is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_columns.is_empty()
    }
}

/// Replaces `healthcare_data` in the store at `db_path` with the contents
/// of `csv_path`.
///
/// # Errors
///
/// Returns [`IngestError`] if the CSV cannot be read, an ID repeats, or
/// any statement fails. Rows are written to a staging table that replaces
/// `healthcare_data` only once every chunk has committed, so a failed load
/// leaves the previous table untouched.
pub fn load_csv(
    csv_path: &Path,
    db_path: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<LoadReport, IngestError> {
    load_csv_chunked(csv_path, db_path, progress, CHUNK_SIZE)
}

#[allow(clippy::too_many_lines)]
fn load_csv_chunked(
    csv_path: &Path,
    db_path: &Path,
    progress: &Arc<dyn ProgressCallback>,
    chunk_size: usize,
) -> Result<LoadReport, IngestError> {
    let start = Instant::now();
    log::info!("Reading {}", csv_path.display());
    progress.set_message(format!("Reading {}", csv_path.display()));

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)?;

    // CSV index for each patient column, in column order.
    let headers = reader.headers()?.clone();
    let mut positions: Vec<(PatientColumn, Option<usize>)> = PatientColumn::all()
        .iter()
        .map(|&column| (column, None))
        .collect();
    let mut ignored_headers = Vec::new();

    for (idx, header) in headers.iter().enumerate() {
        match PatientColumn::from_header(header) {
            Some(column) => {
                if let Some(slot) = positions
                    .iter_mut()
                    .find(|(c, pos)| *c == column && pos.is_none())
                {
                    slot.1 = Some(idx);
                }
            }
            None => ignored_headers.push(header.to_string()),
        }
    }

    let missing_columns: Vec<PatientColumn> = positions
        .iter()
        .filter(|(column, pos)| pos.is_none() && !column.is_primary_key())
        .map(|(column, _)| *column)
        .collect();
    let generated_ids = positions
        .iter()
        .any(|(column, pos)| column.is_primary_key() && pos.is_none());

    for column in &missing_columns {
        log::warn!("Column {} missing from CSV; loading as NULL", column.name());
    }
    if !ignored_headers.is_empty() {
        log::info!("Ignoring CSV columns: {}", ignored_headers.join(", "));
    }
    if generated_ids {
        log::info!("No ID column in CSV; assigning sequential IDs");
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut ids: Vec<Option<i64>> = Vec::new();
    let mut dropped_dates = 0u64;

    for record in reader.records() {
        let record = record?;
        let mut id = None;

        let row = positions
            .iter()
            .map(|&(column, pos)| {
                let raw = pos.and_then(|i| record.get(i));
                if column.is_primary_key() {
                    id = raw.and_then(|v| v.trim().parse::<i64>().ok());
                    return Cell::Null;
                }
                let Some(raw) = raw else {
                    return Cell::Null;
                };
                let (cell, dropped) = clean(column, raw);
                if dropped {
                    dropped_dates += 1;
                }
                cell
            })
            .collect();
        rows.push(row);
        ids.push(id);
    }

    if dropped_dates > 0 {
        log::warn!("{dropped_dates} unparseable date(s) stored as NULL");
    }

    let assigned_ids = assign_ids(&mut rows, &ids, &positions)?;
    if assigned_ids > 0 && !generated_ids {
        log::warn!("{assigned_ids} row(s) had no valid ID; assigned new IDs");
    }

    let mut config = StoreConfig::new(db_path.to_path_buf());
    config.read_only = false;
    let conn = open_connection(&config)?;

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {STAGING_TABLE};\n{};",
        create_table_sql_named(STAGING_TABLE)
    ))?;

    let column_list = PatientColumn::all()
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; PatientColumn::all().len()].join(", ");
    let insert_sql =
        format!("INSERT INTO {STAGING_TABLE} ({column_list}) VALUES ({placeholders})");

    progress.set_total(rows.len() as u64);
    progress.set_message(format!("Loading {TABLE_NAME}"));

    let rows_loaded = match insert_chunks(&conn, &insert_sql, &rows, chunk_size, progress)
        .and_then(|n| swap_in_staging(&conn).map(|()| n))
    {
        Ok(n) => n,
        Err(e) => {
            if let Err(drop_err) =
                conn.execute_batch(&format!("DROP TABLE IF EXISTS {STAGING_TABLE}"))
            {
                log::warn!("Failed to drop {STAGING_TABLE}: {drop_err}");
            }
            return Err(e);
        }
    };

    let duration = start.elapsed();
    progress.finish(format!("Loaded {rows_loaded} rows"));
    log::info!(
        "Loaded {rows_loaded} rows into {} in {:.1}s",
        db_path.display(),
        duration.as_secs_f64()
    );

    Ok(LoadReport {
        rows_loaded,
        missing_columns,
        ignored_headers,
        dropped_dates,
        generated_ids,
        assigned_ids,
        duration,
    })
}

/// Fills the ID cell of every row. Rows without a valid ID get the next
/// value after the largest ID in the file, so they never collide with an
/// explicit one. Returns how many IDs were assigned.
fn assign_ids(
    rows: &mut [Vec<Cell>],
    ids: &[Option<i64>],
    positions: &[(PatientColumn, Option<usize>)],
) -> Result<u64, IngestError> {
    let Some(slot) = positions.iter().position(|(c, _)| c.is_primary_key()) else {
        return Ok(0);
    };

    let mut seen = HashSet::new();
    for &id in ids.iter().flatten() {
        if !seen.insert(id) {
            return Err(IngestError::DuplicateId { id });
        }
    }

    let mut next_id = seen.iter().copied().max().unwrap_or(0).max(0);
    let mut assigned = 0u64;
    for (row, id) in rows.iter_mut().zip(ids) {
        let id = id.unwrap_or_else(|| {
            next_id += 1;
            assigned += 1;
            next_id
        });
        row[slot] = Cell::Integer(id);
    }

    Ok(assigned)
}

/// Inserts `rows` into the staging table in transactions of `chunk_size`.
fn insert_chunks(
    conn: &duckdb::Connection,
    insert_sql: &str,
    rows: &[Vec<Cell>],
    chunk_size: usize,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<u64, IngestError> {
    let mut rows_loaded = 0u64;
    for chunk in rows.chunks(chunk_size.max(1)) {
        conn.execute_batch("BEGIN TRANSACTION")?;
        {
            let mut stmt = conn.prepare(insert_sql)?;
            for row in chunk {
                if let Err(e) = stmt.execute(duckdb::params_from_iter(row.iter())) {
                    drop(stmt);
                    conn.execute_batch("ROLLBACK")?;
                    return Err(e.into());
                }
            }
        }
        conn.execute_batch("COMMIT")?;

        let n = chunk.len() as u64;
        rows_loaded += n;
        progress.inc(n);
        log::debug!("Committed {rows_loaded} rows");
    }
    Ok(rows_loaded)
}

/// Replaces `healthcare_data` with the staging table in one transaction.
fn swap_in_staging(conn: &duckdb::Connection) -> Result<(), IngestError> {
    let swap = format!(
        "BEGIN TRANSACTION;
         DROP TABLE IF EXISTS {TABLE_NAME};
         ALTER TABLE {STAGING_TABLE} RENAME TO {TABLE_NAME};
         COMMIT;"
    );
    if let Err(e) = conn.execute_batch(&swap) {
        conn.execute_batch("ROLLBACK")?;
        return Err(e.into());
    }
    Ok(())
}

/// Checks that `healthcare_data` exists with every patient column and
/// counts its rows.
///
/// # Errors
///
/// Returns [`IngestError::MissingTable`] if the table is absent, or another
/// [`IngestError`] if the store cannot be read.
pub fn verify(db_path: &Path) -> Result<VerifyReport, IngestError> {
    let conn = open_connection(&StoreConfig::new(db_path.to_path_buf()))?;

    let mut stmt = conn.prepare(
        "SELECT column_name FROM information_schema.columns WHERE table_name = ? ORDER BY ordinal_position",
    )?;
    let present: Vec<String> = stmt
        .query_map([TABLE_NAME], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    if present.is_empty() {
        return Err(IngestError::MissingTable { table: TABLE_NAME });
    }

    let missing_columns = PatientColumn::all()
        .iter()
        .filter(|c| !present.iter().any(|p| p.eq_ignore_ascii_case(c.name())))
        .copied()
        .collect();

    let row_count: i64 =
        conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |row| {
            row.get(0)
        })?;

    Ok(VerifyReport {
        row_count: u64::try_from(row_count).unwrap_or(0),
        missing_columns,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::path::PathBuf;

    use super::*;
    use crate::progress::null_progress;

    const SAMPLE: &str = "\
Name,Age,Gender,Blood Type,Medical Condition,Date of Admission,Doctor,Hospital,Insurance Provider,Billing Amount,Room Number,Admission Type,Discharge Date,Medication,Test Results
Bobby JacksOn,30,Male,B-,Cancer,2024-01-31,Matthew Smith,Sons and Miller,Blue Cross,18856.281305978155,328,Urgent,2024-02-02,Paracetamol,Normal
LesLie TErRy,sixty,Male,A+,Obesity,08/20/2019,Samantha Davies,Kim Inc,Medicare,not a number,265,Emergency,2019-08-26,Ibuprofen,Inconclusive
DaNnY sMitH,76,Female,A-,Obesity,someday,Tiffany Mitchell,Cook PLC,Aetna,27955.096078842456,205,Emergency,,Aspirin,Normal
";

    fn write_csv(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("healthcare_dataset.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn query_strings(db: &Path, sql: &str) -> Vec<Option<String>> {
        let conn = duckdb::Connection::open(db).unwrap();
        let mut stmt = conn.prepare(sql).unwrap();
        stmt.query_map([], |row| row.get::<_, Option<String>>(0))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn loads_and_cleans_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = write_csv(tmp.path(), SAMPLE);
        let db = tmp.path().join("data").join("healthcare.duckdb");

        let report = load_csv_chunked(&csv, &db, &null_progress(), 2).unwrap();

        assert_eq!(report.rows_loaded, 3);
        assert!(report.generated_ids);
        assert!(report.missing_columns.is_empty());
        assert_eq!(report.ignored_headers, vec!["Room Number".to_string()]);
        assert_eq!(report.dropped_dates, 1);

        let ids = query_strings(&db, "SELECT CAST(ID AS TEXT) FROM healthcare_data ORDER BY ID");
        assert_eq!(
            ids,
            vec![Some("1".into()), Some("2".into()), Some("3".into())]
        );

        let ages = query_strings(&db, "SELECT CAST(Age AS TEXT) FROM healthcare_data ORDER BY ID");
        assert_eq!(ages[1].as_deref(), Some("0"));

        let billing = query_strings(
            &db,
            "SELECT CAST(Billing_Amount AS TEXT) FROM healthcare_data WHERE ID = 2",
        );
        assert_eq!(billing[0].as_deref(), Some("0.0"));

        let admitted = query_strings(
            &db,
            "SELECT Date_of_Admission FROM healthcare_data ORDER BY ID",
        );
        assert_eq!(
            admitted,
            vec![Some("2024-01-31".into()), Some("2019-08-20".into()), None]
        );

        let discharged = query_strings(&db, "SELECT Discharge_Date FROM healthcare_data WHERE ID = 3");
        assert_eq!(discharged, vec![None]);
    }

    #[test]
    fn reload_replaces_table() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = write_csv(tmp.path(), SAMPLE);
        let db = tmp.path().join("healthcare.duckdb");

        load_csv(&csv, &db, &null_progress()).unwrap();
        load_csv(&csv, &db, &null_progress()).unwrap();

        assert_eq!(verify(&db).unwrap().row_count, 3);
    }

    #[test]
    fn keeps_existing_ids_and_reports_missing_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = write_csv(tmp.path(), "ID,Name,Gender\n10,A,Male\n,B,Female\n");
        let db = tmp.path().join("healthcare.duckdb");

        let report = load_csv(&csv, &db, &null_progress()).unwrap();

        assert!(!report.generated_ids);
        assert!(report.missing_columns.contains(&PatientColumn::Age));
        assert!(!report.missing_columns.contains(&PatientColumn::Gender));
        assert_eq!(report.assigned_ids, 1);
        let ids = query_strings(&db, "SELECT CAST(ID AS TEXT) FROM healthcare_data ORDER BY ID");
        assert_eq!(ids, vec![Some("10".into()), Some("11".into())]);
        let ages = query_strings(&db, "SELECT CAST(Age AS TEXT) FROM healthcare_data");
        assert_eq!(ages, vec![None, None]);
    }

    #[test]
    fn missing_id_is_assigned_past_explicit_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = write_csv(tmp.path(), "ID,Name,Gender\n2,A,Male\n,B,Female\n");
        let db = tmp.path().join("healthcare.duckdb");

        let report = load_csv(&csv, &db, &null_progress()).unwrap();

        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.assigned_ids, 1);
        let rows = query_strings(
            &db,
            "SELECT CAST(ID AS TEXT) || ':' || Name FROM healthcare_data ORDER BY ID",
        );
        assert_eq!(rows, vec![Some("2:A".into()), Some("3:B".into())]);
    }

    #[test]
    fn duplicate_ids_keep_previous_table() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("healthcare.duckdb");
        load_csv(&write_csv(tmp.path(), SAMPLE), &db, &null_progress()).unwrap();

        let dup = tmp.path().join("dup.csv");
        std::fs::write(&dup, "ID,Name\n1,A\n1,B\n").unwrap();
        let err = load_csv(&dup, &db, &null_progress()).unwrap_err();

        assert!(matches!(err, IngestError::DuplicateId { id: 1 }));
        assert_eq!(verify(&db).unwrap().row_count, 3);
    }

    #[test]
    fn successful_load_leaves_no_staging_table() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = write_csv(tmp.path(), SAMPLE);
        let db = tmp.path().join("healthcare.duckdb");
        load_csv(&csv, &db, &null_progress()).unwrap();

        let tables = query_strings(
            &db,
            "SELECT table_name FROM information_schema.tables ORDER BY table_name",
        );
        assert_eq!(tables, vec![Some(TABLE_NAME.to_string())]);
    }

    #[test]
    fn verify_reports_complete_table() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = write_csv(tmp.path(), SAMPLE);
        let db = tmp.path().join("healthcare.duckdb");
        load_csv(&csv, &db, &null_progress()).unwrap();

        let report = verify(&db).unwrap();
        assert_eq!(report.row_count, 3);
        assert!(report.is_complete());
    }

    #[test]
    fn verify_without_table_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("empty.duckdb");
        duckdb::Connection::open(&db).unwrap();

        assert!(matches!(
            verify(&db),
            Err(IngestError::MissingTable { .. })
        ));
    }
}
