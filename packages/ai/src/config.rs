//! Sampling and robustness settings shared by both model calls.

use std::time::Duration;

/// Settings applied to every completion request.
///
/// `temperature` defaults to zero: SQL correctness matters more than
/// phrasing diversity, and deterministic sampling keeps runs reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the reply.
    pub max_tokens: u32,
    /// Wall-clock bound on a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub retry_base_delay: Duration,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl CompletionSettings {
    /// Reads `AI_TEMPERATURE`, `AI_MAX_TOKENS`, `AI_TIMEOUT_SECS` and
    /// `AI_MAX_RETRIES`, falling back to [`Default`] for anything unset or
    /// unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temperature: env_parse("AI_TEMPERATURE").unwrap_or(defaults.temperature),
            max_tokens: env_parse("AI_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            timeout: env_parse("AI_TIMEOUT_SECS").map_or(defaults.timeout, Duration::from_secs),
            max_retries: env_parse("AI_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_base_delay: defaults.retry_base_delay,
        }
    }

    /// Returns the backoff delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.retry_base_delay.saturating_mul(factor)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_deterministic() {
        let settings = CompletionSettings::default();
        assert!(settings.temperature.abs() < f32::EPSILON);
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn backoff_doubles() {
        let settings = CompletionSettings {
            retry_base_delay: Duration::from_millis(100),
            ..CompletionSettings::default()
        };
        assert_eq!(settings.backoff(1), Duration::from_millis(100));
        assert_eq!(settings.backoff(2), Duration::from_millis(200));
        assert_eq!(settings.backoff(3), Duration::from_millis(400));
    }
}
