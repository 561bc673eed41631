use serde::Deserialize;
use url::Url;

use crate::google::GoogleCredentials;

/// Speech-to-text configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// Credentials override for the recognizer
    #[serde(default)]
    pub credentials: Option<GoogleCredentials>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// BCP-47 language of the recordings
    #[serde(default = "default_language_code")]
    pub language_code: String,
    /// Sample rate sent for codecs without a self-describing header
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hertz: Option<u32>,
    /// Ask the recognizer to insert punctuation
    #[serde(default = "default_true")]
    pub enable_automatic_punctuation: bool,
    /// Recognition model (e.g. "latest_long")
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: None,
            language_code: default_language_code(),
            sample_rate_hertz: default_sample_rate(),
            enable_automatic_punctuation: true,
            model: None,
        }
    }
}

fn default_language_code() -> String {
    "en-US".to_string()
}

#[allow(clippy::unnecessary_wraps)]
const fn default_sample_rate() -> Option<u32> {
    Some(44_100)
}

const fn default_true() -> bool {
    true
}
