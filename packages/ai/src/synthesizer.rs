//! SQL synthesis from a natural-language question.

use std::sync::Arc;

use crate::config::CompletionSettings;
use crate::prompts;
use crate::providers::LlmProvider;
use crate::retry::complete_with_retry;

/// Prefix of the text returned in place of SQL when synthesis fails.
pub const GENERATION_FAILED_PREFIX: &str = "Error generating SQL query: ";

/// Turns questions into SQL text with a completion model.
#[derive(Clone)]
pub struct SqlSynthesizer {
    provider: Arc<dyn LlmProvider>,
    settings: CompletionSettings,
}

impl SqlSynthesizer {
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self { provider, settings }
    }

    /// Returns SQL for `question`, or a [`GENERATION_FAILED_PREFIX`] message.
    ///
    /// The reply is trimmed and otherwise used verbatim. An empty question
    /// is forwarded as-is. This never fails: errors and empty replies come
    /// back as text so the executor can report them.
    pub async fn synthesize(&self, question: &str) -> String {
        let messages = prompts::synthesis_messages(question);

        match complete_with_retry(self.provider.as_ref(), &messages, &self.settings).await {
            Ok(reply) => {
                let sql = reply.trim();
                if sql.is_empty() {
                    log::warn!("Model returned an empty SQL reply");
                    format!("{GENERATION_FAILED_PREFIX}model returned an empty reply")
                } else {
                    sql.to_string()
                }
            }
            Err(e) => {
                log::error!("SQL synthesis failed: {e}");
                format!("{GENERATION_FAILED_PREFIX}{e}")
            }
        }
    }
}
