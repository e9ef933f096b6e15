//! Visual text detection (OCR) client.
//!
//! Implements the `TextDetector` port over the Google Vision
//! `images:annotate` REST API with the TEXT_DETECTION feature.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, AiResult};
use crate::ports::TextDetector;

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com/v1";

/// Vision client configuration.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub base_url: String,
}

impl VisionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| AiError::config("GOOGLE_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("VISION_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

/// Google Vision API client.
pub struct VisionClient {
    config: VisionConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: Image,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct Image {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    r#type: String,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

impl VisionClient {
    /// Create a new vision client.
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        Ok(Self::new(VisionConfig::from_env()?))
    }
}

#[async_trait]
impl TextDetector for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> AiResult<String> {
        let url = format!(
            "{}/images:annotate?key={}",
            self.config.base_url, self.config.api_key
        );

        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: Image {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature {
                    r#type: "TEXT_DETECTION".to_string(),
                    max_results: 1,
                }],
            }],
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

        let parsed: AnnotateResponse = response.json().await?;

        // The first annotation aggregates the full detected text; the rest
        // are per-word boxes we don't need.
        let text = parsed
            .responses
            .first()
            .and_then(|r| r.text_annotations.first())
            .map(|a| a.description.trim().to_string())
            .unwrap_or_default();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_detect_text_takes_aggregate_annotation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images:annotate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{
                    "textAnnotations": [
                        {"description": "SLIDE 1\nIntroduction"},
                        {"description": "SLIDE"}
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new(VisionConfig {
            api_key: "k".to_string(),
            base_url: server.uri(),
        });

        let text = client.detect_text(b"jpeg").await.unwrap();
        assert_eq!(text, "SLIDE 1\nIntroduction");
    }

    #[tokio::test]
    async fn test_detect_text_no_annotations_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{}]
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new(VisionConfig {
            api_key: "k".to_string(),
            base_url: server.uri(),
        });

        let text = client.detect_text(b"jpeg").await.unwrap();
        assert!(text.is_empty());
    }
}
