use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::TokenUsage;

const SYSTEM_PREAMBLE: &str = "You are a careful medical summarization assistant.";

/// Raw output of one completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Sends a prompt to the language model. One attempt per call, no retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError>;

    /// Model name recorded in summary metadata and audit entries.
    fn model(&self) -> &str;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsClient {
    http: Client,
    config: ProviderConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Request)?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PREAMBLE },
                { "role": "user", "content": prompt }
            ],
            "max_tokens": self.config.max_tokens
        });

        debug!("Calling {} with model {}", self.endpoint(), self.config.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API request failed: {}", status);
            return Err(status_error(status, body));
        }

        let response_json: Value = response.json().await?;
        parse_completion(&response_json, &self.config.model)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,
        _ => ProviderError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

fn parse_completion(response_json: &Value, requested_model: &str) -> Result<Completion, ProviderError> {
    let text = response_json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ProviderError::Malformed("missing choices[0].message.content".to_string()))?
        .trim()
        .to_string();

    let model = response_json["model"]
        .as_str()
        .unwrap_or(requested_model)
        .to_string();

    // Usage is optional; a partial block is treated as absent.
    let usage = response_json
        .get("usage")
        .and_then(|usage| serde_json::from_value::<TokenUsage>(usage.clone()).ok());

    Ok(Completion { text, model, usage })
}
