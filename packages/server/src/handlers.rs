//! HTTP handler functions for the healthcare chat API.

use actix_web::{HttpResponse, web};
use healthcare_chat_database::{DbError, aggregates};
use healthcare_chat_server_models::{
    AdmissionTypeCountResponse, ApiHealth, ApiMessage, BloodConditionCountResponse,
    BloodTypeCountResponse, ChatRequest, GenderConditionCountResponse, GenderCountResponse,
    TestResultCountResponse,
};
use serde::Serialize;

use crate::AppState;

/// `GET /`
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(ApiMessage::new("API is running"))
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /get-response`
///
/// Runs the question through the pipeline. Always answers 200 with both
/// `query` and `response`; failures are described inside those fields.
pub async fn get_response(
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> HttpResponse {
    let response = state.pipeline.handle(&body.prompt).await;
    HttpResponse::Ok().json(response)
}

/// Serializes an aggregate result, or logs the failure and answers 500.
fn aggregate_response<T: Serialize>(what: &str, result: Result<T, DbError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => {
            log::error!("Failed to query {what}: {e}");
            HttpResponse::InternalServerError()
                .json(ApiMessage::new(format!("Failed to query {what}")))
        }
    }
}

/// `GET /gender-count`
pub async fn gender_count(state: web::Data<AppState>) -> HttpResponse {
    let result = aggregates::gender_counts(state.store.as_ref())
        .await
        .map(|gender_counts| GenderCountResponse { gender_counts });
    aggregate_response("gender counts", result)
}

/// `GET /blood-type-count`
pub async fn blood_type_count(state: web::Data<AppState>) -> HttpResponse {
    let result = aggregates::blood_type_counts(state.store.as_ref())
        .await
        .map(|blood_type_counts| BloodTypeCountResponse { blood_type_counts });
    aggregate_response("blood type counts", result)
}

/// `GET /blood-condition-count`
pub async fn blood_condition_count(state: web::Data<AppState>) -> HttpResponse {
    let result = aggregates::blood_condition_counts(state.store.as_ref())
        .await
        .map(|blood_condition_counts| BloodConditionCountResponse {
            blood_condition_counts,
        });
    aggregate_response("blood condition counts", result)
}

/// `GET /gender-condition-count`
pub async fn gender_condition_count(state: web::Data<AppState>) -> HttpResponse {
    let result = aggregates::gender_condition_counts(state.store.as_ref())
        .await
        .map(|gender_condition_counts| GenderConditionCountResponse {
            gender_condition_counts,
        });
    aggregate_response("gender condition counts", result)
}

/// `GET /admission-type-count`
pub async fn admission_type_count(state: web::Data<AppState>) -> HttpResponse {
    let result = aggregates::admission_type_counts(state.store.as_ref())
        .await
        .map(|admission_type_counts| AdmissionTypeCountResponse {
            admission_type_counts,
        });
    aggregate_response("admission type counts", result)
}

/// `GET /test-result-count`
pub async fn test_result_count(state: web::Data<AppState>) -> HttpResponse {
    let result = aggregates::test_result_counts(state.store.as_ref())
        .await
        .map(|test_result_counts| TestResultCountResponse { test_result_counts });
    aggregate_response("test result counts", result)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use healthcare_chat_ai::AiError;
    use healthcare_chat_ai::pipeline::{Pipeline, PipelineSettings};
    use healthcare_chat_ai::providers::{CompletionRequest, LlmProvider, Role};
    use healthcare_chat_database::store::{DuckDbStore, QueryStore, StoreConfig};
    use healthcare_chat_patient_models::create_table_sql;
    use serde_json::{Value, json};

    use super::*;

    /// Answers synthesis with a fixed statement and echoes summary data.
    struct EchoProvider {
        sql: &'static str,
    }

    #[async_trait::async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
            let system = &request.messages[0];
            assert_eq!(system.role, Role::System);
            if system.content.contains("converts natural language") {
                return Ok(self.sql.to_string());
            }
            let user = &request.messages[1].content;
            let data = user
                .lines()
                .find_map(|line| line.strip_prefix("SQL Data: "))
                .unwrap_or_default();
            Ok(format!("Summary: {data}"))
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn seeded_store() -> (tempfile::TempDir, Arc<dyn QueryStore>) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("healthcare.duckdb");
        {
            let conn = duckdb::Connection::open(&path).unwrap();
            conn.execute_batch(&create_table_sql()).unwrap();
            conn.execute_batch(
                "INSERT INTO healthcare_data (ID, Name, Gender, Blood_Type, Medical_Condition, Admission_Type, Test_Results) VALUES
                   (1, 'A', 'Male',   'A+', 'Cancer',  'Urgent',   'Normal'),
                   (2, 'B', 'Male',   'B-', 'Obesity', 'Elective', 'Abnormal'),
                   (3, 'C', 'Male',   'A+', 'Cancer',  'Urgent',   'Normal'),
                   (4, 'D', 'Female', 'A+', 'Asthma',  'Urgent',   'Inconclusive');",
            )
            .unwrap();
        }
        (tmp, Arc::new(DuckDbStore::new(StoreConfig::new(path))))
    }

    fn state(store: Arc<dyn QueryStore>, sql: &'static str) -> web::Data<AppState> {
        let pipeline = Pipeline::new(
            Arc::new(EchoProvider { sql }),
            store.clone(),
            PipelineSettings::default(),
        );
        web::Data::new(AppState {
            pipeline: Arc::new(pipeline),
            store,
        })
    }

    #[actix_web::test]
    async fn home_and_health() {
        let (_tmp, store) = seeded_store();
        let app = test::init_service(
            App::new()
                .app_data(state(store, "SELECT 1"))
                .configure(crate::configure),
        )
        .await;

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(body, json!({"message": "API is running"}));

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn get_response_returns_query_and_answer() {
        let (_tmp, store) = seeded_store();
        let sql = "SELECT COUNT(*) FROM healthcare_data WHERE Gender = 'Male'";
        let app = test::init_service(
            App::new()
                .app_data(state(store, sql))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/get-response")
            .set_json(json!({"prompt": "How many male patients are there?"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["query"], sql);
        assert_eq!(body["response"], "Summary: There are 3 matching records.");
    }

    #[actix_web::test]
    async fn get_response_is_200_when_store_is_missing() {
        let store: Arc<dyn QueryStore> = Arc::new(DuckDbStore::new(StoreConfig::new(
            PathBuf::from("/nonexistent/healthcare.duckdb"),
        )));
        let app = test::init_service(
            App::new()
                .app_data(state(store, "SELECT * FROM healthcare_data"))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/get-response")
            .set_json(json!({"prompt": "List patients"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert!(
            body["response"]
                .as_str()
                .unwrap()
                .starts_with("Summary: Query execution failed: ")
        );
    }

    #[actix_web::test]
    async fn aggregate_endpoints() {
        let (_tmp, store) = seeded_store();
        let app = test::init_service(
            App::new()
                .app_data(state(store, "SELECT 1"))
                .configure(crate::configure),
        )
        .await;

        let get = |uri: &'static str| test::TestRequest::get().uri(uri).to_request();

        let body: Value = test::call_and_read_body_json(&app, get("/gender-count")).await;
        assert_eq!(body, json!({"gender_counts": {"Female": 1, "Male": 3}}));

        let body: Value = test::call_and_read_body_json(&app, get("/blood-type-count")).await;
        assert_eq!(body["blood_type_counts"]["A+"], 3);

        let body: Value = test::call_and_read_body_json(&app, get("/blood-condition-count")).await;
        assert_eq!(body["blood_condition_counts"]["A+"]["Cancer"], 2);

        let body: Value =
            test::call_and_read_body_json(&app, get("/gender-condition-count")).await;
        assert_eq!(body["gender_condition_counts"]["Female"]["Asthma"], 1);

        let body: Value = test::call_and_read_body_json(&app, get("/admission-type-count")).await;
        assert_eq!(body["admission_type_counts"]["Urgent"], 3);

        let body: Value = test::call_and_read_body_json(&app, get("/test-result-count")).await;
        assert_eq!(body["test_result_counts"]["Normal"], 2);
    }

    #[actix_web::test]
    async fn aggregate_failure_is_500() {
        let store: Arc<dyn QueryStore> = Arc::new(DuckDbStore::new(StoreConfig::new(
            PathBuf::from("/nonexistent/healthcare.duckdb"),
        )));
        let app = test::init_service(
            App::new()
                .app_data(state(store, "SELECT 1"))
                .configure(crate::configure),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/gender-count").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
