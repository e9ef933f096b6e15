//! Gemini generative client.
//!
//! Implements the `Generator` port over the Gemini `generateContent` REST
//! API, with an ordered fallback model list. The raw candidate text is
//! returned untouched; structured extraction is the caller's concern.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AiError, AiResult};
use crate::ports::{Generator, InlineMedia};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order until one answers.
const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub models: Vec<String>,
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AiError::config("GEMINI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        })
    }
}

/// Gemini API client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    /// Call the generateContent endpoint for one model.
    async fn call_model(
        &self,
        model: &str,
        prompt: &str,
        media: Option<&InlineMedia>,
    ) -> AiResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let mut parts = vec![Part::Text(prompt.to_string())];
        if let Some(media) = media {
            parts.push(Part::InlineData(InlineData {
                mime_type: media.mime_type.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(&media.bytes),
            }));
        }

        let request = GeminiRequest {
            contents: vec![Content { parts }],
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;

        gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| AiError::invalid_response("No content in Gemini response"))
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str, media: Option<InlineMedia>) -> AiResult<String> {
        let mut last_error = None;

        for model in &self.config.models {
            match self.call_model(model, prompt, media.as_ref()).await {
                Ok(text) => {
                    info!("Generated content with model {}", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AiError::config("No Gemini models configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String, models: Vec<String>) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            base_url,
            models,
        })
    }

    fn candidate_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("hello")))
            .mount(&server)
            .await;

        let client = test_client(server.uri(), vec!["gemini-2.5-flash".to_string()]);
        let text = client.generate("prompt", None).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_generate_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/primary:generateContent"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/secondary:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("fallback")))
            .mount(&server)
            .await;

        let client = test_client(
            server.uri(),
            vec!["primary".to_string(), "secondary".to_string()],
        );
        let text = client.generate("prompt", None).await.unwrap();
        assert_eq!(text, "fallback");
    }

    #[tokio::test]
    async fn test_generate_surfaces_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client(server.uri(), vec!["only".to_string()]);
        let err = client.generate("prompt", None).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
