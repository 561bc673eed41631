use serde::Deserialize;
use url::Url;

use crate::google::GoogleCredentials;

/// Placeholder the prompt template must contain
pub const TRANSCRIPT_PLACEHOLDER: &str = "{transcript}";

/// Generative model configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerativeConfig {
    /// Credentials override for the model API
    #[serde(default)]
    pub credentials: Option<GoogleCredentials>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model name (e.g. "gemini-2.0-flash")
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,
    /// Response MIME type hint; "application/json" asks for bare JSON output
    #[serde(default = "default_response_mime_type")]
    pub response_mime_type: Option<String>,
    /// How the model's text is turned into CRM data
    #[serde(default)]
    pub parse_mode: ParseMode,
    /// Custom prompt; must contain `{transcript}`
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            response_mime_type: default_response_mime_type(),
            parse_mode: ParseMode::default(),
            prompt_template: None,
        }
    }
}

/// Strategy for parsing model output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Decode the whole response as JSON (a Markdown fence is tolerated)
    Strict,
    /// Locate the JSON object inside free text, salvaging the summary if decoding fails
    #[default]
    Extract,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

#[allow(clippy::unnecessary_wraps)]
const fn default_temperature() -> Option<f64> {
    Some(0.2)
}

#[allow(clippy::unnecessary_wraps)]
fn default_response_mime_type() -> Option<String> {
    Some("application/json".to_string())
}
