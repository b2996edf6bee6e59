//! Natural-language summaries of execution results.

use std::sync::Arc;

use healthcare_chat_database_models::ExecutionResult;

use crate::config::CompletionSettings;
use crate::prompts;
use crate::providers::LlmProvider;
use crate::retry::complete_with_retry;

/// Prefix of the text returned in place of a summary when the model call
/// fails.
pub const REFINEMENT_FAILED_PREFIX: &str = "Error refining response: ";

/// Maximum bytes of rendered result data embedded in the summary prompt.
///
/// Larger results are truncated to keep the prompt inside the model's
/// context window.
pub const MAX_RESULT_BYTES: usize = 8_000;

/// Renders `result` for the prompt, truncating at [`MAX_RESULT_BYTES`].
#[must_use]
pub fn render_for_prompt(result: &ExecutionResult) -> String {
    let rendered = result.render();
    if rendered.len() <= MAX_RESULT_BYTES {
        return rendered;
    }

    let mut end = MAX_RESULT_BYTES;
    while !rendered.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... (truncated, {} bytes total)",
        &rendered[..end],
        rendered.len()
    )
}

/// Explains execution results in prose with a completion model.
#[derive(Clone)]
pub struct ResponseSummarizer {
    provider: Arc<dyn LlmProvider>,
    settings: CompletionSettings,
}

impl ResponseSummarizer {
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self { provider, settings }
    }

    /// Summarizes `result` as an answer to `question`.
    ///
    /// Error results are summarized like any other payload. Model failures
    /// and empty replies come back as [`REFINEMENT_FAILED_PREFIX`] text.
    pub async fn summarize(&self, question: &str, result: &ExecutionResult) -> String {
        let data = render_for_prompt(result);
        let messages = prompts::summary_messages(question, &data);

        match complete_with_retry(self.provider.as_ref(), &messages, &self.settings).await {
            Ok(reply) => {
                let summary = reply.trim();
                if summary.is_empty() {
                    log::warn!("Model returned an empty summary");
                    format!("{REFINEMENT_FAILED_PREFIX}model returned an empty reply")
                } else {
                    summary.to_string()
                }
            }
            Err(e) => {
                log::error!("Response summarization failed: {e}");
                format!("{REFINEMENT_FAILED_PREFIX}{e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use healthcare_chat_database_models::Record;

    use super::*;

    #[test]
    fn small_results_are_untouched() {
        let result = ExecutionResult::message("There are 3 matching records.");
        assert_eq!(render_for_prompt(&result), "There are 3 matching records.");
    }

    #[test]
    fn large_results_are_truncated_on_char_boundary() {
        let mut record = Record::new();
        record.insert("Name".to_string(), "é".repeat(10_000).into());
        let result = ExecutionResult::records(vec![record]);

        let rendered = render_for_prompt(&result);
        assert!(rendered.contains("... (truncated, "));
        assert!(rendered.len() < MAX_RESULT_BYTES + 64);
    }
}
