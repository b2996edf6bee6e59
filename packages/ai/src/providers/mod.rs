//! LLM provider abstraction and implementations.
//!
//! Supports `OpenAI`-compatible servers (Groq, `OpenAI`, local servers),
//! Anthropic, and AWS Bedrock via a common trait.

pub mod anthropic;
#[cfg(feature = "bedrock")]
pub mod bedrock;
pub mod openai;

use serde::{Deserialize, Serialize};

use crate::AiError;

/// Groq's `OpenAI`-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the exchange.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Returns the wire name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Plain-text content.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single chat completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Ordered messages, system messages first.
    pub messages: &'a [Message],
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the reply.
    pub max_tokens: u32,
}

impl CompletionRequest<'_> {
    /// Joins all system messages into one prompt, for providers that take
    /// the system prompt out of band.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Returns the non-system messages in order.
    pub fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a chat completion request and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the reply has no text.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError>;

    /// Returns the model identifier, for logging.
    fn model(&self) -> &str;
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `GROQ_API_KEY` set -> Groq
/// 2. `OPENAI_API_KEY` set (or `AI_BASE_URL` set) -> `OpenAI`-compatible
/// 3. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 4. AWS credentials available -> Bedrock
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
#[allow(clippy::unused_async)] // async is needed when bedrock feature is enabled
pub async fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());
    let model_override = std::env::var("AI_MODEL").ok();
    let base_url_override = std::env::var("AI_BASE_URL").ok();

    match provider.to_lowercase().as_str() {
        "groq" => {
            let api_key = require_env("GROQ_API_KEY")?;
            let model = model_override.unwrap_or_else(|| "llama3-8b-8192".to_string());
            let base_url = base_url_override.unwrap_or_else(|| GROQ_BASE_URL.to_string());
            Ok(Box::new(openai::OpenAiProvider::new(
                Some(api_key),
                model,
                base_url,
            )))
        }
        "openai" | "gpt" => {
            // Local OpenAI-compatible servers usually need no key.
            let api_key = std::env::var("OPENAI_API_KEY").ok();
            if api_key.is_none() && base_url_override.is_none() {
                return Err(AiError::Config {
                    message: "OPENAI_API_KEY environment variable not set".to_string(),
                });
            }
            let model = model_override.unwrap_or_else(|| "gpt-4o-mini".to_string());
            let base_url =
                base_url_override.unwrap_or_else(|| openai::OPENAI_BASE_URL.to_string());
            Ok(Box::new(openai::OpenAiProvider::new(api_key, model, base_url)))
        }
        "anthropic" | "claude" => {
            let api_key = require_env("ANTHROPIC_API_KEY")?;
            let model = model_override.unwrap_or_else(|| "claude-sonnet-4-20250514".to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        #[cfg(feature = "bedrock")]
        "bedrock" | "aws" => {
            let model = model_override
                .unwrap_or_else(|| "us.anthropic.claude-sonnet-4-20250514-v1:0".to_string());
            let region = std::env::var("AWS_REGION")
                .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
                .ok();
            let provider = bedrock::BedrockProvider::new(model, region).await;
            Ok(Box::new(provider))
        }
        #[cfg(not(feature = "bedrock"))]
        "bedrock" | "aws" => Err(AiError::Config {
            message: "Bedrock support not compiled. Rebuild with --features bedrock".to_string(),
        }),
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'groq', 'openai', 'anthropic', or 'bedrock'."
            ),
        }),
    }
}

fn require_env(key: &str) -> Result<String, AiError> {
    std::env::var(key).map_err(|_| AiError::Config {
        message: format!("{key} environment variable not set"),
    })
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    if std::env::var("GROQ_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Groq (GROQ_API_KEY found)");
        return "groq".to_string();
    }

    if std::env::var("OPENAI_API_KEY").is_ok() || std::env::var("AI_BASE_URL").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI-compatible");
        return "openai".to_string();
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    let has_aws_keys = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
    let has_aws_profile = std::env::var("AWS_PROFILE").is_ok();
    if has_aws_keys || has_aws_profile {
        log::info!("Auto-detected AI provider: Bedrock (AWS credentials found)");
        return "bedrock".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set one of: GROQ_API_KEY, OPENAI_API_KEY, \
         AI_BASE_URL, ANTHROPIC_API_KEY, or AWS credentials. You can also set \
         AI_PROVIDER explicitly."
    );

    // Fall back to groq so the missing-key error names a variable
    "groq".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_system_prompt_from_conversation() {
        let messages = vec![
            Message::system("schema"),
            Message::user("question"),
            Message::system("rules"),
        ];
        let request = CompletionRequest {
            messages: &messages,
            temperature: 0.0,
            max_tokens: 16,
        };
        assert_eq!(request.system_prompt(), "schema\n\nrules");
        let rest: Vec<_> = request.conversation().collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].content, "question");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
        assert_eq!(Role::System.as_str(), "system");
    }
}
