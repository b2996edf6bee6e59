#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for healthcare chat.
//!
//! Serves the question-answering endpoint (`POST /get-response`) backed by
//! the natural-language-to-SQL pipeline, plus the fixed aggregate endpoints
//! the dashboard charts are drawn from.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use healthcare_chat_ai::pipeline::Pipeline;
use healthcare_chat_database::store::QueryStore;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Shared application state.
pub struct AppState {
    /// Question-answering pipeline.
    pub pipeline: Arc<Pipeline>,
    /// Store queried by the aggregate endpoints.
    pub store: Arc<dyn QueryStore>,
}

/// Registers every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::home))
        .route("/health", web::get().to(handlers::health))
        .route("/get-response", web::post().to(handlers::get_response))
        .route("/gender-count", web::get().to(handlers::gender_count))
        .route("/blood-type-count", web::get().to(handlers::blood_type_count))
        .route(
            "/blood-condition-count",
            web::get().to(handlers::blood_condition_count),
        )
        .route(
            "/gender-condition-count",
            web::get().to(handlers::gender_condition_count),
        )
        .route(
            "/admission-type-count",
            web::get().to(handlers::admission_type_count),
        )
        .route("/test-result-count", web::get().to(handlers::test_result_count));
}

/// Starts the healthcare chat API server.
///
/// Builds the pipeline and store from the environment (see
/// [`Pipeline::from_env`]), then serves on `BIND_ADDR`:`PORT`. This is a
/// regular async function; the caller is responsible for providing the
/// async runtime (e.g. via `#[actix_web::main]`) and for initializing
/// logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if no model provider is configured,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!("Building pipeline...");
    let (pipeline, store) = Pipeline::from_env()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = web::Data::new(AppState {
        pipeline: Arc::new(pipeline),
        store,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
