//! AWS Bedrock provider implementation using the Converse API.

use aws_sdk_bedrockruntime::types::{
    self as bedrock, ContentBlock as BedrockContent, ConversationRole, Message as BedrockMessage,
    SystemContentBlock,
};

use super::{CompletionRequest, LlmProvider, Role};
use crate::AiError;

/// AWS Bedrock provider using the Converse API.
///
/// Authentication uses the standard AWS credential chain (env vars, IAM
/// role, `~/.aws/credentials`).
pub struct BedrockProvider {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockProvider {
    /// Creates a new Bedrock provider.
    ///
    /// Loads AWS configuration from the environment (region, credentials).
    /// The `model_id` should be a Bedrock model ID such as
    /// `us.anthropic.claude-sonnet-4-20250514-v1:0`.
    pub async fn new(model_id: String, region: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }

        let config = config_loader.load().await;
        let client = aws_sdk_bedrockruntime::Client::new(&config);

        Self { client, model_id }
    }
}

#[async_trait::async_trait]
impl LlmProvider for BedrockProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
        let messages = convert_messages(request)?;

        let mut converse = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(messages))
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(i32::try_from(request.max_tokens).unwrap_or(i32::MAX))
                    .temperature(request.temperature)
                    .build(),
            );

        let system = request.system_prompt();
        if !system.is_empty() {
            converse = converse.system(SystemContentBlock::Text(system));
        }

        let response = converse.send().await.map_err(|e| AiError::Provider {
            message: format!("Bedrock Converse error: {e}"),
        })?;

        let output = response.output().ok_or_else(|| AiError::Provider {
            message: "No output in Bedrock response".to_string(),
        })?;

        let bedrock::ConverseOutput::Message(response_msg) = output else {
            return Err(AiError::Provider {
                message: "Unexpected Bedrock output variant".to_string(),
            });
        };

        let text: String = response_msg
            .content()
            .iter()
            .filter_map(|block| match block {
                BedrockContent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if text.is_empty() {
            return Err(AiError::Provider {
                message: "No text content in Bedrock response".to_string(),
            });
        }

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model_id
    }
}

/// Converts the non-system messages to Bedrock `Message` format.
fn convert_messages(request: &CompletionRequest<'_>) -> Result<Vec<BedrockMessage>, AiError> {
    request
        .conversation()
        .map(|msg| {
            let role = match msg.role {
                Role::Assistant => ConversationRole::Assistant,
                Role::User | Role::System => ConversationRole::User,
            };

            BedrockMessage::builder()
                .role(role)
                .content(BedrockContent::Text(msg.content.clone()))
                .build()
                .map_err(|e| AiError::Provider {
                    message: format!("Failed to build Bedrock Message: {e}"),
                })
        })
        .collect()
}
