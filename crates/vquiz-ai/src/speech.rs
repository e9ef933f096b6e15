//! Speech-to-Text transcription client.
//!
//! Implements the `Transcriber` port over the Google Speech-to-Text
//! `speech:recognize` REST API.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AiError, AiResult};
use crate::ports::Transcriber;

const DEFAULT_BASE_URL: &str = "https://speech.googleapis.com/v1";

/// Speech client configuration.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_key: String,
    pub base_url: String,
}

impl SpeechConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| AiError::config("GOOGLE_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("SPEECH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

/// Google Speech-to-Text API client.
pub struct SpeechClient {
    config: SpeechConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: String,
    sample_rate_hertz: u32,
    language_code: String,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl SpeechClient {
    /// Create a new speech client.
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        Ok(Self::new(SpeechConfig::from_env()?))
    }
}

#[async_trait]
impl Transcriber for SpeechClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        sample_rate_hz: u32,
        language_code: &str,
    ) -> AiResult<String> {
        let url = format!(
            "{}/speech:recognize?key={}",
            self.config.base_url, self.config.api_key
        );

        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16".to_string(),
                sample_rate_hertz: sample_rate_hz,
                language_code: language_code.to_string(),
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio),
            },
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

        let parsed: RecognizeResponse = response.json().await?;

        let transcript = parsed
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        debug!("Transcribed {} chars", transcript.len());
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transcribe_joins_result_alternatives() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speech:recognize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"alternatives": [{"transcript": "hello world"}]},
                    {"alternatives": [{"transcript": "second segment"}]}
                ]
            })))
            .mount(&server)
            .await;

        let client = SpeechClient::new(SpeechConfig {
            api_key: "k".to_string(),
            base_url: server.uri(),
        });

        let text = client.transcribe(b"pcm", 16_000, "en-US").await.unwrap();
        assert_eq!(text, "hello world second segment");
    }

    #[tokio::test]
    async fn test_transcribe_empty_results_is_empty_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = SpeechClient::new(SpeechConfig {
            api_key: "k".to_string(),
            base_url: server.uri(),
        });

        let text = client.transcribe(b"pcm", 16_000, "en-US").await.unwrap();
        assert!(text.is_empty());
    }
}
