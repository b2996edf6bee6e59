#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM provider abstraction and the natural-language-to-SQL pipeline.
//!
//! Supports Groq and any other `OpenAI`-compatible server (Ollama, vLLM,
//! llama.cpp, LM Studio) via `AI_BASE_URL`, `OpenAI`, Anthropic Claude, and
//! AWS Bedrock (feature-gated).
//!
//! A request flows through three stages, each of which turns its own
//! failures into data instead of returning an error:
//!
//! 1. [`synthesizer::SqlSynthesizer`] asks the model for SQL grounded in the
//!    table descriptor.
//! 2. [`healthcare_chat_database::executor::QueryExecutor`] runs it and
//!    shapes the rows.
//! 3. [`summarizer::ResponseSummarizer`] asks the model to explain the
//!    result in prose.
//!
//! [`pipeline::Pipeline`] sequences them and always returns both the query
//! and the response.

pub mod config;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod summarizer;
pub mod synthesizer;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider answered with a non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// A completion attempt did not finish in time.
    #[error("Completion timed out after {seconds}s")]
    Timeout {
        /// The per-attempt timeout.
        seconds: u64,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

impl AiError {
    /// Returns `true` if the error is likely transient and worth retrying.
    ///
    /// Timeouts, connection failures, rate limiting (429) and server errors
    /// (5xx) are transient. Other 4xx responses, malformed bodies and
    /// configuration errors are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_) | Self::Provider { .. } | Self::Config { .. } => false,
        }
    }
}
