//! Hosted text model seam.
//!
//! Flows hand a filled prompt to a `TextModel` and get text back. The
//! production adapter calls the Generative Language `generateContent`
//! endpoint; tests script their own implementation.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use st_core::config::ModelConfig;
use st_core::error::{StError, StResult};

use crate::client::{check_status, HttpClient};
use crate::response::{GenerateContentResponse, GoogleErrorEnvelope};

/// One generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Ask the model for a JSON document instead of free text.
    pub json_output: bool,
    /// Overrides the configured temperature.
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_output: false,
            temperature: None,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_output: true,
            temperature: None,
        }
    }
}

/// A hosted text-generation model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier for logs.
    fn name(&self) -> &str;

    /// Generate a completion for the prompt.
    async fn generate(&self, request: &GenerateRequest) -> StResult<String>;
}

/// Generative Language REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http: HttpClient,
    api_base: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    /// Build a client from the model configuration.
    ///
    /// Fails with `MissingConfig` when no API key is set.
    pub fn new(config: &ModelConfig) -> StResult<Self> {
        if config.api_key.is_empty() {
            return Err(StError::MissingConfig("model.api_key".into()));
        }
        if config.model.is_empty() {
            return Err(StError::MissingConfig("model.model".into()));
        }

        let http = HttpClient::new(config.timeout_ms)?.with_header("x-goog-api-key", &config.api_key);

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn request_body(&self, request: &GenerateRequest) -> serde_json::Value {
        let mut generation_config = json!({
            "temperature": request.temperature.unwrap_or(self.temperature),
        });
        if request.json_output {
            generation_config["responseMimeType"] = json!("application/json");
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> StResult<String> {
        let body = self.request_body(request);
        debug!(model = %self.model, json = request.json_output, "generating");

        let response = self.http.post_json(&self.endpoint(), &body).await?;
        let response = match check_status(response).await {
            Ok(r) => r,
            Err(StError::ServerError { status, message }) => {
                let message = GoogleErrorEnvelope::message_from(&message);
                warn!(status, "model request failed: {message}");
                return Err(StError::Model(format!("HTTP {status}: {message}")));
            }
            Err(e) => return Err(e),
        };

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| StError::Model(format!("unreadable model response: {e}")))?;

        if let Some(reason) = parsed.block_reason() {
            return Err(StError::Model(format!("prompt blocked: {reason}")));
        }

        parsed
            .text()
            .ok_or_else(|| StError::Model("model returned no text".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        let mut config = st_core::AppConfig::default().model;
        config.api_key = "key".into();
        config.api_base = "https://example.test/v1beta/".into();
        config
    }

    #[test]
    fn test_requires_api_key() {
        let mut cfg = config();
        cfg.api_key.clear();
        assert!(matches!(GeminiClient::new(&cfg), Err(StError::MissingConfig(_))));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&config()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(client.name(), "gemini-2.0-flash");
    }

    #[test]
    fn test_request_body_json_mode() {
        let client = GeminiClient::new(&config()).unwrap();
        let body = client.request_body(&GenerateRequest::json("hello"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let plain = client.request_body(&GenerateRequest::text("hi"));
        assert!(plain["generationConfig"].get("responseMimeType").is_none());
    }
}
