//! Client for the hosted generative-language API.
//!
//! Speaks the `generateContent` protocol: one prompt in, the concatenated text
//! parts of the first candidate out.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::error::ApiError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the generative API.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl AiClient {
    /// Create a new generative API client.
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, model = model, "AI client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }

    /// Send one prompt and return the reply text.
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn generate_text(
        &self,
        prompt: &str,
        request_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let url = format!("{}:generateContent", self.model_url());

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 2048,
            },
        };

        let mut req = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body);

        if let Some(rid) = request_id {
            req = req.header("x-request-id", rid);
        }

        debug!(url = %url, "Generative API request");

        let response = req.send().await.map_err(|e| {
            error!(error = %e, "Generative API request failed");
            ApiError::ServiceUnavailable(format!("Generative API unavailable: {}", e))
        })?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ApiErrorEnvelope>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("Generative API error: {}", status));

            return match status {
                StatusCode::BAD_REQUEST => Err(ApiError::BadRequest(message)),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    error!("Generative API rejected the credential");
                    Err(ApiError::Internal(anyhow::anyhow!("Generative API auth error")))
                }
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                    Err(ApiError::ServiceUnavailable(message))
                }
                _ => {
                    error!(status = %status, message = %message, "Generative API error");
                    Err(ApiError::Internal(anyhow::anyhow!(message)))
                }
            };
        }

        let payload: GenerateResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse generative API response");
            ApiError::Internal(anyhow::anyhow!("Invalid generative API response: {}", e))
        })?;

        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "Generative API returned no text"
            )));
        }

        Ok(text)
    }

    /// Check that the configured model is reachable with the credential.
    pub async fn health_check(&self) -> Result<()> {
        self.client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Generative API health check failed")?
            .error_for_status()
            .context("Generative API unhealthy")?;

        Ok(())
    }
}
