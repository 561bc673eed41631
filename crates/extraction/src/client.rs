//! Google Generative Language API client

use nova_config::{Config, GenerativeConfig};
use nova_core::{GoogleAuth, http_client, read_upstream_error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Text produced by one `generateContent` call
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub finish_reason: Option<String>,
    pub total_tokens: Option<u32>,
}

/// Client for a single generative model
pub struct GenerativeClient {
    client: Client,
    base_url: String,
    auth: GoogleAuth,
    model: String,
    temperature: Option<f64>,
    response_mime_type: Option<String>,
}

impl GenerativeClient {
    /// Build the client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config
            .google
            .resolve(config.generative.credentials.as_ref())
            .ok_or_else(|| ExtractionError::ConfigError("credentials required for generative".to_string()))?;

        Ok(Self::new(&config.generative, GoogleAuth::from_credentials(credentials)?))
    }

    pub fn new(config: &GenerativeConfig, auth: GoogleAuth) -> Self {
        let base_url = config
            .base_url
            .as_ref()
            .map_or(DEFAULT_BASE_URL, url::Url::as_str)
            .trim_end_matches('/')
            .to_string();

        Self {
            client: http_client(),
            base_url,
            auth,
            model: config.model.clone(),
            temperature: config.temperature,
            response_mime_type: config.response_mime_type.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user prompt and return the first candidate's text
    pub async fn generate(&self, prompt: &str) -> Result<Generation> {
        self.send(&self.build_request(prompt, self.response_mime_type.as_deref()))
            .await
    }

    /// Like [`Self::generate`] but without the response MIME type, for free-form answers
    pub async fn generate_text(&self, prompt: &str) -> Result<Generation> {
        self.send(&self.build_request(prompt, None)).await
    }

    async fn send(&self, request: &GenerateContentRequest<'_>) -> Result<Generation> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(model = %self.model, "generateContent request");

        let response = self
            .auth
            .authorize(self.client.post(&url))
            .await?
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(model = %self.model, error = %e, "upstream request failed");
                ExtractionError::ConnectionError(format!("Failed to send request to the generative API: {e}"))
            })?;

        if !response.status().is_success() {
            let (status, message) = read_upstream_error(response).await;
            tracing::warn!(model = %self.model, status, "upstream returned error");
            return Err(ExtractionError::from_status(status, message));
        }

        let wire_response: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!(model = %self.model, error = %e, "failed to parse generateContent response");
            ExtractionError::InternalError
        })?;

        let generation = first_candidate_text(wire_response)?;

        tracing::debug!(
            model = %self.model,
            finish_reason = generation.finish_reason.as_deref().unwrap_or("unknown"),
            total_tokens = generation.total_tokens,
            "generateContent complete"
        );

        Ok(generation)
    }

    fn build_request<'a>(&self, prompt: &'a str, response_mime_type: Option<&'a str>) -> GenerateContentRequest<'a> {
        let generation_config = (self.temperature.is_some() || response_mime_type.is_some()).then(|| {
            GenerationConfig {
                temperature: self.temperature,
                response_mime_type,
            }
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config,
        }
    }
}

// -- Request types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
}

// -- Response types --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u32>,
}

fn first_candidate_text(response: GenerateContentResponse) -> Result<Generation> {
    let total_tokens = response.usage_metadata.and_then(|usage| usage.total_token_count);

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map_or_else(|| "no candidates".to_string(), |reason| format!("prompt blocked ({reason})"));
        return Err(ExtractionError::EmptyResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "empty candidate".to_string());
        return Err(ExtractionError::EmptyResponse(reason));
    }

    Ok(Generation {
        text,
        finish_reason: candidate.finish_reason,
        total_tokens,
    })
}
