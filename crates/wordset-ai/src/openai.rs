use crate::{
    generator::{DefinitionGenerator, SetGenerationRequest},
    Error, Result,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use wordset_core::NewDefinition;

const SET_GENERATOR_SYSTEM: &str = include_str!("../prompts/set_generator.txt");

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4-1106-preview".to_string(),
            api_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 1024,
            request_timeout: Duration::from_secs(55),
        }
    }
}

/// Definition generator backed by the OpenAI chat completions API.
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, client })
    }

    async fn call_api(&self, messages: Vec<Message>) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": &self.config.model,
                "messages": messages,
                "max_tokens": self.config.max_tokens,
                "response_format": { "type": "json_object" },
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(Error::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimitExceeded),
            status => {
                let body = response.text().await?;
                return Err(Error::ApiError {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let result: ChatResponse = response.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::ModelDelusions("completion has no content".to_string()))
    }
}

#[async_trait]
impl DefinitionGenerator for OpenAiGenerator {
    async fn generate_definitions(
        &self,
        request: &SetGenerationRequest,
    ) -> Result<Vec<NewDefinition>> {
        tracing::info!(name = %request.name, model = %self.config.model, "generating definitions");

        let messages = vec![
            Message {
                role: "system".to_string(),
                content: SET_GENERATOR_SYSTEM.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: request.to_prompt(),
            },
        ];

        let content = self.call_api(messages).await?;
        let definitions = parse_set_generation(&content)?;

        tracing::debug!(count = definitions.len(), "model returned definitions");

        Ok(definitions)
    }
}

/// Decode the model's JSON envelope. Generated definitions carry no sentences.
fn parse_set_generation(content: &str) -> Result<Vec<NewDefinition>> {
    let body = strip_code_fence(content);
    let result: SetGenerationResult = serde_json::from_str(body)
        .map_err(|e| Error::ModelDelusions(format!("{}: {}", e, content)))?;

    if !result.success {
        return Err(Error::Unsuccessful(result.reason));
    }

    result
        .definitions
        .into_iter()
        .map(|generated| {
            let definition = NewDefinition::new(generated.phrase, generated.meaning);
            definition
                .validate()
                .map_err(|e| Error::ModelDelusions(e.to_string()))?;
            Ok(definition)
        })
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetGenerationResult {
    success: bool,
    #[serde(default)]
    definitions: Vec<GeneratedDefinition>,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedDefinition {
    phrase: String,
    meaning: String,
}
