//! The question-to-answer pipeline.
//!
//! `RECEIVED -> SYNTHESIZED -> EXECUTED -> SUMMARIZED -> RETURNED`
//!
//! Every stage encodes its own failures as data, so [`Pipeline::handle`]
//! has no error path and always fills both response fields.

use std::sync::Arc;
use std::time::Instant;

use healthcare_chat_database::executor::QueryExecutor;
use healthcare_chat_database::store::{DuckDbStore, QueryStore, StoreConfig};
use healthcare_chat_database_models::AggregateDetection;
use serde::{Deserialize, Serialize};

use crate::AiError;
use crate::config::CompletionSettings;
use crate::providers::{LlmProvider, create_provider_from_env};
use crate::summarizer::ResponseSummarizer;
use crate::synthesizer::SqlSynthesizer;

/// What a caller gets back for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResponse {
    /// The synthesized SQL, or a synthesis error message.
    pub query: String,
    /// The prose answer, or a summarization error message.
    pub response: String,
}

/// Tunables for a [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    /// Sampling and retry settings for both model calls.
    pub completion: CompletionSettings,
    /// How aggregate count queries are recognized.
    pub detection: AggregateDetection,
}

impl PipelineSettings {
    /// Reads completion settings plus `AGGREGATE_DETECTION`.
    #[must_use]
    pub fn from_env() -> Self {
        let detection = std::env::var("AGGREGATE_DETECTION")
            .ok()
            .and_then(|v| {
                v.trim()
                    .parse::<AggregateDetection>()
                    .inspect_err(|_| log::warn!("Ignoring unknown AGGREGATE_DETECTION={v}"))
                    .ok()
            })
            .unwrap_or_default();

        Self {
            completion: CompletionSettings::from_env(),
            detection,
        }
    }
}

/// Sequences synthesis, execution and summarization for a question.
///
/// Holds its collaborators for the life of the process; nothing is kept
/// between requests, so one instance can serve concurrent callers.
#[derive(Clone)]
pub struct Pipeline {
    synthesizer: SqlSynthesizer,
    executor: QueryExecutor,
    summarizer: ResponseSummarizer,
}

impl Pipeline {
    /// Creates a pipeline over an existing model client and store.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn QueryStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            synthesizer: SqlSynthesizer::new(provider.clone(), settings.completion.clone()),
            executor: QueryExecutor::new(store).with_detection(settings.detection),
            summarizer: ResponseSummarizer::new(provider, settings.completion),
        }
    }

    /// Builds a pipeline from environment variables, returning the store
    /// too so callers can share it.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if no model provider is configured.
    pub async fn from_env() -> Result<(Self, Arc<dyn QueryStore>), AiError> {
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider_from_env().await?);
        let store_config = StoreConfig::from_env();
        log::info!(
            "Using model {} over {} (read-only: {})",
            provider.model(),
            store_config.path.display(),
            store_config.read_only
        );
        let store: Arc<dyn QueryStore> = Arc::new(DuckDbStore::new(store_config));
        let pipeline = Self::new(provider, store.clone(), PipelineSettings::from_env());
        Ok((pipeline, store))
    }

    /// Answers `question`. Never fails.
    pub async fn handle(&self, question: &str) -> PipelineResponse {
        let started = Instant::now();
        log::info!("RECEIVED: {question:?}");

        let query = self.synthesizer.synthesize(question).await;
        log::info!("SYNTHESIZED: {query}");

        let result = self.executor.execute(&query).await;
        if result.is_error() {
            log::info!("EXECUTED: {}", result.render());
        } else {
            log::info!("EXECUTED: success");
        }

        let response = self.summarizer.summarize(question, &result).await;
        log::info!("SUMMARIZED: {} chars", response.len());

        log::info!("RETURNED in {:.2}s", started.elapsed().as_secs_f64());
        PipelineResponse { query, response }
    }
}
