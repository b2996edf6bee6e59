//! Fixed `GROUP BY` aggregations behind the dashboard endpoints.
//!
//! Each aggregation runs through the same [`QueryStore`] as the
//! natural-language pipeline, so it shares the statement timeout and the
//! read-only guard. Null and blank labels are dropped; labels are trimmed.

use healthcare_chat_database_models::{CountMap, NestedCountMap, QueryOutput};
use healthcare_chat_patient_models::{PatientColumn, TABLE_NAME};

use crate::DbError;
use crate::store::QueryStore;

/// Counts rows per distinct value of `column`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_by(store: &dyn QueryStore, column: PatientColumn) -> Result<CountMap, DbError> {
    let col = column.name();
    let sql = format!(
        "SELECT TRIM(CAST({col} AS TEXT)) AS label, COUNT(*) AS n \
         FROM {TABLE_NAME} \
         WHERE {col} IS NOT NULL AND TRIM(CAST({col} AS TEXT)) <> '' \
         GROUP BY 1 ORDER BY 1"
    );
    let output = store.query(&sql).await?;
    Ok(to_count_map(&output))
}

/// Counts rows per distinct (`outer`, `inner`) pair, nested by `outer`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_by_pair(
    store: &dyn QueryStore,
    outer: PatientColumn,
    inner: PatientColumn,
) -> Result<NestedCountMap, DbError> {
    let (o, i) = (outer.name(), inner.name());
    let sql = format!(
        "SELECT TRIM(CAST({o} AS TEXT)) AS outer_label, TRIM(CAST({i} AS TEXT)) AS inner_label, \
                COUNT(*) AS n \
         FROM {TABLE_NAME} \
         WHERE {o} IS NOT NULL AND {i} IS NOT NULL \
           AND TRIM(CAST({o} AS TEXT)) <> '' AND TRIM(CAST({i} AS TEXT)) <> '' \
         GROUP BY 1, 2 ORDER BY 1, 2"
    );
    let output = store.query(&sql).await?;
    Ok(to_nested_count_map(&output))
}

/// Patients per gender.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn gender_counts(store: &dyn QueryStore) -> Result<CountMap, DbError> {
    count_by(store, PatientColumn::Gender).await
}

/// Patients per blood type.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn blood_type_counts(store: &dyn QueryStore) -> Result<CountMap, DbError> {
    count_by(store, PatientColumn::BloodType).await
}

/// Medical conditions per blood type.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn blood_condition_counts(store: &dyn QueryStore) -> Result<NestedCountMap, DbError> {
    count_by_pair(store, PatientColumn::BloodType, PatientColumn::MedicalCondition).await
}

/// Medical conditions per gender.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn gender_condition_counts(store: &dyn QueryStore) -> Result<NestedCountMap, DbError> {
    count_by_pair(store, PatientColumn::Gender, PatientColumn::MedicalCondition).await
}

/// Patients per admission type.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn admission_type_counts(store: &dyn QueryStore) -> Result<CountMap, DbError> {
    count_by(store, PatientColumn::AdmissionType).await
}

/// Patients per test result.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn test_result_counts(store: &dyn QueryStore) -> Result<CountMap, DbError> {
    count_by(store, PatientColumn::TestResults).await
}

fn label(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn count(value: Option<&serde_json::Value>) -> i64 {
    value.and_then(serde_json::Value::as_i64).unwrap_or(0)
}

fn to_count_map(output: &QueryOutput) -> CountMap {
    output
        .rows
        .iter()
        .filter_map(|row| Some((label(row.first())?, count(row.get(1)))))
        .collect()
}

fn to_nested_count_map(output: &QueryOutput) -> NestedCountMap {
    let mut map = NestedCountMap::new();
    for row in &output.rows {
        let (Some(outer), Some(inner)) = (label(row.first()), label(row.get(1))) else {
            continue;
        };
        *map.entry(outer).or_default().entry(inner).or_default() += count(row.get(2));
    }
    map
}

#[cfg(test)]
mod tests {
    use duckdb::Connection;
    use healthcare_chat_patient_models::create_table_sql;

    use super::*;
    use crate::store::{DuckDbStore, StoreConfig};

    fn seeded_store() -> (tempfile::TempDir, DuckDbStore) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("healthcare.duckdb");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(&create_table_sql()).unwrap();
            conn.execute_batch(
                "INSERT INTO healthcare_data (ID, Name, Gender, Blood_Type, Medical_Condition, Admission_Type, Test_Results) VALUES
                   (1, 'A', 'Male',    'A+', 'Cancer',   'Urgent',    'Normal'),
                   (2, 'B', ' Male ',  'A+', 'Asthma',   'Emergency', 'Abnormal'),
                   (3, 'C', 'Female',  'O-', 'Cancer',   'Elective',  'Normal'),
                   (4, 'D', NULL,      'O-', 'Cancer',   'Elective',  NULL),
                   (5, 'E', 'Female',  NULL, 'Diabetes', 'Urgent',    'Inconclusive');",
            )
            .unwrap();
        }
        (tmp, DuckDbStore::new(StoreConfig::new(path)))
    }

    #[tokio::test]
    async fn gender_counts_trim_and_drop_nulls() {
        let (_tmp, store) = seeded_store();
        let counts = gender_counts(&store).await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["Male"], 2);
        assert_eq!(counts["Female"], 2);
    }

    #[tokio::test]
    async fn single_dimension_counts() {
        let (_tmp, store) = seeded_store();
        let blood = blood_type_counts(&store).await.unwrap();
        assert_eq!(blood["A+"], 2);
        assert_eq!(blood["O-"], 2);

        let admission = admission_type_counts(&store).await.unwrap();
        assert_eq!(admission["Urgent"], 2);
        assert_eq!(admission["Elective"], 2);
        assert_eq!(admission["Emergency"], 1);

        let tests = test_result_counts(&store).await.unwrap();
        assert_eq!(tests.values().sum::<i64>(), 4);
    }

    #[tokio::test]
    async fn nested_condition_counts() {
        let (_tmp, store) = seeded_store();
        let by_blood = blood_condition_counts(&store).await.unwrap();
        assert_eq!(by_blood["A+"]["Cancer"], 1);
        assert_eq!(by_blood["A+"]["Asthma"], 1);
        assert_eq!(by_blood["O-"]["Cancer"], 2);
        assert!(!by_blood.contains_key(""));

        let by_gender = gender_condition_counts(&store).await.unwrap();
        assert_eq!(by_gender["Male"]["Cancer"], 1);
        assert_eq!(by_gender["Female"]["Diabetes"], 1);
    }

    #[test]
    fn count_map_skips_null_labels() {
        let output = QueryOutput {
            columns: vec!["label".to_string(), "n".to_string()],
            rows: vec![
                vec![serde_json::json!("X"), serde_json::json!(4)],
                vec![serde_json::Value::Null, serde_json::json!(9)],
            ],
        };
        let map = to_count_map(&output);
        assert_eq!(map.len(), 1);
        assert_eq!(map["X"], 4);
    }
}
