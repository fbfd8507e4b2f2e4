use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::{
    config::Config,
    error::{ModelError, ValidationError},
    schema::Contract,
};

/// A single prompt plus the JSON shape the reply has to take.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub output_schema: Value,
}

/// An external generative-text provider.
///
/// One call is one attempt; implementations must not retry or stream.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<Value, ModelError>;

    fn name(&self) -> &str;
}

// Structures matching Ollama's /api/generate endpoint
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool, // We want the full response, not a stream
    format: &'a Value, // JSON schema the reply must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a Value>,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    response: String, // The generated text
    #[serde(default)]
    done: bool,
}

pub struct OllamaProvider {
    client: Client,
    generate_url: String,
    model: String,
    options: Option<Value>,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            generate_url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.into(),
            options: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        Self::new(&config.ollama_url, config.model.clone(), config.request_timeout)
    }

    /// Sampling options passed through verbatim, e.g. `{"temperature": 0.2}`.
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(&self, request: GenerateRequest) -> Result<Value, ModelError> {
        let payload = OllamaRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            format: &request.output_schema,
            options: self.options.as_ref(),
        };

        debug!(url = %self.generate_url, prompt_len = request.prompt.len(), "Sending prompt to Ollama");

        let response = self
            .client
            .post(&self.generate_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.generate_url, "Failed to reach Ollama: {}", e);
                ModelError::from(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Ollama API request failed");
            return Err(ModelError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply = response.json::<OllamaResponse>().await?;
        debug!(model = %reply.model, done = reply.done, "Received Ollama reply");

        parse_reply(&reply.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Parses the provider's text as JSON. Models sometimes wrap JSON in a
/// Markdown code fence even when asked not to.
pub fn parse_reply(text: &str) -> Result<Value, ModelError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelError::MissingReply);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced).map_err(|e| ModelError::UnparseableReply(e.to_string()))
}

/// Failure of a single invocation: either the provider failed, or its reply
/// did not fit the output schema.
#[derive(Debug)]
pub enum InvokeError {
    Model(ModelError),
    Output(ValidationError),
}

/// Sends prompts to a provider and checks replies against the output schema.
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn ModelProvider>,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn invoke<O: Contract>(&self, prompt: String) -> Result<O, InvokeError> {
        let schema = O::schema();
        let request = GenerateRequest {
            prompt,
            output_schema: schema.to_json_schema(),
        };

        let raw = self.provider.generate(request).await.map_err(InvokeError::Model)?;
        schema.parse(raw).map_err(InvokeError::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reply_plain_json() {
        assert_eq!(parse_reply(" {\"response\": \"hi\"} ").unwrap(), json!({ "response": "hi" }));
    }

    #[test]
    fn test_parse_reply_strips_code_fence() {
        let text = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(parse_reply(text).unwrap(), json!({ "summary": "ok" }));
        let text = "```\n{\"summary\": \"ok\"}\n```";
        assert_eq!(parse_reply(text).unwrap(), json!({ "summary": "ok" }));
    }

    #[test]
    fn test_parse_reply_rejects_prose() {
        assert!(matches!(parse_reply("Sure! Here you go."), Err(ModelError::UnparseableReply(_))));
        assert!(matches!(parse_reply("   "), Err(ModelError::MissingReply)));
    }

    #[test]
    fn test_generate_url_has_single_slash() {
        let provider = OllamaProvider::new("http://localhost:11434/", "m", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.generate_url, "http://localhost:11434/api/generate");
    }
}
