//! `OpenAI`-compatible chat completions provider.
//!
//! Used for `OpenAI` itself, Groq, and self-hosted servers that speak the
//! `/chat/completions` protocol.

use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LlmProvider};
use crate::AiError;

/// `OpenAI`'s public endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI`-compatible API provider.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new provider for `base_url` (without the
    /// `/chat/completions` suffix).
    #[must_use]
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the full completions URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn build_request<'a>(model: &'a str, request: &'a CompletionRequest<'_>) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model,
        messages: request
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn parse_response(body: &str) -> Result<String, AiError> {
    let response: OpenAiResponse = serde_json::from_str(body)?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AiError::Provider {
            message: "No choices in completion response".to_string(),
        })
}

fn parse_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<OpenAiError>(body)
        .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);
    AiError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
        let payload = build_request(&self.model, request);

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&payload);

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let resp = builder.send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        parse_response(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Message;

    #[test]
    fn serializes_messages_with_sampling() {
        let messages = vec![Message::system("schema"), Message::user("how many?")];
        let request = CompletionRequest {
            messages: &messages,
            temperature: 0.0,
            max_tokens: 256,
        };
        let body = serde_json::to_value(build_request("llama3-8b-8192", &request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "llama3-8b-8192",
                "messages": [
                    {"role": "system", "content": "schema"},
                    {"role": "user", "content": "how many?"}
                ],
                "temperature": 0.0,
                "max_tokens": 256
            })
        );
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" SELECT 1 "}}]}"#;
        assert_eq!(parse_response(body).unwrap(), " SELECT 1 ");
    }

    #[test]
    fn empty_choices_is_provider_error() {
        let err = parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, AiError::Provider { .. }));
    }

    #[test]
    fn parses_error_body() {
        let err = parse_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit reached"}}"#,
        );
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "API error (HTTP 429): Rate limit reached");

        let err = parse_error(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert!(err.to_string().contains("HTTP 502 Bad Gateway: <html>"));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let provider = OpenAiProvider::new(
            None,
            "m".to_string(),
            "http://localhost:11434/v1/".to_string(),
        );
        assert_eq!(
            provider.endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }
}
