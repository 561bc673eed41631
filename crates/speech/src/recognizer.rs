use base64::{Engine, engine::general_purpose::STANDARD};
use nova_config::{Config, SpeechConfig};
use nova_core::{GoogleAuth, http_client, read_upstream_error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    AudioEncoding, StagedAudio,
    error::{Result, SpeechError},
};

const DEFAULT_SPEECH_API_URL: &str = "https://speech.googleapis.com/v1";

/// Transcript text returned when the recognizer hears nothing
pub const NO_SPEECH_DETECTED: &str = "No speech detected.";

/// Result of recognizing one upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub text: String,
    /// Mean confidence of the chosen alternatives, when the recognizer reports it
    pub confidence: Option<f32>,
    pub detected_speech: bool,
}

/// Google Cloud Speech-to-Text client for synchronous recognition
pub struct Recognizer {
    client: Client,
    base_url: String,
    auth: GoogleAuth,
    language_code: String,
    sample_rate_hertz: Option<u32>,
    enable_automatic_punctuation: bool,
    model: Option<String>,
}

impl Recognizer {
    /// Build the recognizer from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config
            .google
            .resolve(config.speech.credentials.as_ref())
            .ok_or_else(|| SpeechError::ConfigError("credentials required for speech".to_string()))?;

        Ok(Self::new(&config.speech, GoogleAuth::from_credentials(credentials)?))
    }

    pub fn new(config: &SpeechConfig, auth: GoogleAuth) -> Self {
        let base_url = config
            .base_url
            .as_ref()
            .map_or(DEFAULT_SPEECH_API_URL, url::Url::as_str)
            .trim_end_matches('/')
            .to_string();

        Self {
            client: http_client(),
            base_url,
            auth,
            language_code: config.language_code.clone(),
            sample_rate_hertz: config.sample_rate_hertz,
            enable_automatic_punctuation: config.enable_automatic_punctuation,
            model: config.model.clone(),
        }
    }

    /// Transcribe a staged upload
    pub async fn recognize(&self, audio: &StagedAudio) -> Result<Transcript> {
        let bytes = audio.read().await?;
        let encoding = audio.encoding();

        tracing::debug!(
            filename = audio.filename(),
            bytes = bytes.len(),
            ?encoding,
            "speech recognition request"
        );

        let request = self.build_request(encoding, &bytes);
        let url = format!("{}/speech:recognize", self.base_url);

        let response = self
            .auth
            .authorize(self.client.post(&url))
            .await?
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Speech request failed: {e}");
                SpeechError::ConnectionError(format!("Failed to send request to Speech-to-Text: {e}"))
            })?;

        if !response.status().is_success() {
            let (status, message) = read_upstream_error(response).await;
            tracing::error!("Speech API error ({status}): {message}");
            return Err(SpeechError::from_status(status, message));
        }

        let result: RecognizeResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Speech response: {e}");
            SpeechError::InternalError(None)
        })?;

        let transcript = assemble_transcript(result);

        tracing::debug!(
            chars = transcript.text.len(),
            detected_speech = transcript.detected_speech,
            "speech recognition complete"
        );

        Ok(transcript)
    }

    fn build_request<'a>(&'a self, encoding: AudioEncoding, bytes: &[u8]) -> RecognizeRequest<'a> {
        let sample_rate_hertz = if encoding.has_header() {
            None
        } else {
            self.sample_rate_hertz
        };

        RecognizeRequest {
            config: RecognitionConfig {
                encoding,
                sample_rate_hertz,
                language_code: &self.language_code,
                enable_automatic_punctuation: self.enable_automatic_punctuation,
                model: self.model.as_deref(),
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(bytes),
            },
        }
    }
}

// -- Wire types --

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: AudioEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechRecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechRecognitionResult {
    #[serde(default)]
    alternatives: Vec<SpeechRecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechRecognitionAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Join the best alternative of every result into one transcript
fn assemble_transcript(response: RecognizeResponse) -> Transcript {
    let best: Vec<SpeechRecognitionAlternative> = response
        .results
        .into_iter()
        .filter_map(|result| result.alternatives.into_iter().next())
        .collect();

    let text = best
        .iter()
        .map(|alt| alt.transcript.trim())
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let confidences: Vec<f32> = best.iter().filter_map(|alt| alt.confidence).collect();

    #[allow(clippy::cast_precision_loss)]
    let confidence = (!confidences.is_empty()).then(|| confidences.iter().sum::<f32>() / confidences.len() as f32);

    if text.is_empty() {
        Transcript {
            text: NO_SPEECH_DETECTED.to_string(),
            confidence: None,
            detected_speech: false,
        }
    } else {
        Transcript {
            text,
            confidence,
            detected_speech: true,
        }
    }
}
