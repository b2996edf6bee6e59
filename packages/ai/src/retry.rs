//! Bounded, retrying completion calls.
//!
//! Every model call in the pipeline goes through [`complete_with_retry`] so
//! a hung provider cannot stall a request forever and a single rate-limit
//! response does not fail it outright.

use crate::AiError;
use crate::config::CompletionSettings;
use crate::providers::{CompletionRequest, LlmProvider, Message};

/// Sends `messages` to `provider` with the sampling options from
/// `settings`, retrying transient failures with exponential backoff.
///
/// Each attempt is bounded by [`CompletionSettings::timeout`]. Permanent
/// failures (see [`AiError::is_transient`]) are returned immediately.
///
/// # Errors
///
/// Returns the last [`AiError`] once retries are exhausted, or the first
/// permanent one.
pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    messages: &[Message],
    settings: &CompletionSettings,
) -> Result<String, AiError> {
    let request = CompletionRequest {
        messages,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    };

    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(settings.timeout, provider.complete(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout {
                seconds: settings.timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && attempt < settings.max_retries => {
                attempt += 1;
                let delay = settings.backoff(attempt);
                log::warn!(
                    "Completion from {} failed (attempt {attempt}/{}), retrying in {delay:?}: {e}",
                    provider.model(),
                    settings.max_retries + 1,
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    struct FlakyProvider {
        failures: Mutex<Vec<AiError>>,
        calls: Mutex<u32>,
    }

    impl FlakyProvider {
        fn new(failures: Vec<AiError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for FlakyProvider {
        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, AiError> {
            *self.calls.lock().unwrap() += 1;
            let next = self.failures.lock().unwrap().pop();
            next.map_or_else(|| Ok("SELECT 1".to_string()), Err)
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    struct HangingProvider;

    #[async_trait::async_trait]
    impl LlmProvider for HangingProvider {
        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, AiError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn model(&self) -> &str {
            "hanging"
        }
    }

    fn fast_settings(max_retries: u32) -> CompletionSettings {
        CompletionSettings {
            timeout: Duration::from_millis(50),
            max_retries,
            retry_base_delay: Duration::from_millis(1),
            ..CompletionSettings::default()
        }
    }

    fn rate_limited() -> AiError {
        AiError::Api {
            status: 429,
            message: "slow down".to_string(),
        }
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let provider = FlakyProvider::new(vec![rate_limited(), rate_limited()]);
        let text = complete_with_retry(&provider, &[Message::user("q")], &fast_settings(3))
            .await
            .unwrap();
        assert_eq!(text, "SELECT 1");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let provider = FlakyProvider::new(vec![rate_limited(), rate_limited(), rate_limited()]);
        let err = complete_with_retry(&provider, &[Message::user("q")], &fast_settings(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Api { status: 429, .. }));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let provider = FlakyProvider::new(vec![AiError::Api {
            status: 401,
            message: "bad key".to_string(),
        }]);
        let err = complete_with_retry(&provider, &[Message::user("q")], &fast_settings(3))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Api { status: 401, .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn hung_provider_times_out() {
        let err = complete_with_retry(&HangingProvider, &[Message::user("q")], &fast_settings(0))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Timeout { .. }));
    }
}
