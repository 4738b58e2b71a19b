//! @ai:module:intent Gemini generateContent HTTP client
//! @ai:module:layer infrastructure
//! @ai:module:public_api GeminiClient
//! @ai:module:stateless true

use crate::config::ApiConfig;
use crate::narrative::api_key;
use crate::narrative::client::{GenerationError, TextGenerator};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

/// @ai:intent generateContent response body
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// @ai:intent Client for the Gemini text-generation endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    config: ApiConfig,
    api_key: String,
}

impl GeminiClient {
    /// @ai:intent Create a client with an explicit API key
    /// @ai:effects pure
    pub fn new(config: ApiConfig, api_key: String) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// @ai:intent Resolve the API key from the environment or `.env` and build a client
    /// @ai:post returns None when no usable key is configured
    /// @ai:effects env, fs:read
    pub fn from_env(config: &ApiConfig, dotenv_dir: &Path) -> Option<Self> {
        let key = match api_key::resolve_api_key(&config.api_key_env, dotenv_dir) {
            Some(key) => key,
            None => {
                tracing::info!("{} not set; AI interpretation disabled", config.api_key_env);
                return None;
            }
        };

        if let Err(reason) = api_key::validate_api_key(&key) {
            tracing::warn!("Ignoring {}: {}", config.api_key_env, reason);
            return None;
        }

        match Self::new(config.clone(), key) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("Failed to build HTTP client: {}", e);
                None
            }
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// @ai:intent Build the request body for a prompt
    /// @ai:effects pure
    fn build_request<'a>(config: &ApiConfig, prompt: &'a str) -> ApiRequest<'a> {
        ApiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
            },
        }
    }

    /// @ai:intent Join the text parts of the first candidate
    /// @ai:effects pure
    fn extract_text(response: ApiResponse) -> Result<String, GenerationError> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }

    /// @ai:intent Turn an error body into a readable message
    /// @ai:effects pure
    fn error_message(body: &str) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match envelope.error.status {
                Some(status) => format!("{}: {}", status, envelope.error.message),
                None => envelope.error.message,
            },
            Err(_) => body.to_string(),
        }
    }
}

impl TextGenerator for GeminiClient {
    /// @ai:effects network
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = Self::build_request(&self.config, prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Http {
                status: status.as_u16(),
                message: Self::error_message(&body),
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("invalid response body: {}", e)))?;

        Self::extract_text(api_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let config = ApiConfig::default();
        let request = GeminiClient::build_request(&config, "Analyse this");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "Analyse this");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8000);
        assert_eq!(json["generationConfig"]["topK"], 40);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r###"{"candidates":[{"content":{"parts":[{"text":"## 1. "},{"text":"Summary"}]}}]}"###;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(GeminiClient::extract_text(response).unwrap(), "## 1. Summary");
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let response: ApiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(
            GeminiClient::extract_text(response).unwrap_err(),
            GenerationError::EmptyResponse
        );

        let blocked: ApiResponse = serde_json::from_str(r#"{"candidates":[{}]}"#).unwrap();
        assert!(GeminiClient::extract_text(blocked).is_err());
    }

    #[test]
    fn test_error_message_from_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            GeminiClient::error_message(body),
            "RESOURCE_EXHAUSTED: Quota exceeded"
        );
        assert_eq!(GeminiClient::error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_endpoint() {
        let config = ApiConfig {
            base_url: "https://example.test/v1beta/".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(config, "key".to_string()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
