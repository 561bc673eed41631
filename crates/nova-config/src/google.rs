use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

/// Shared Google Cloud settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleConfig {
    /// Credentials used by any service that does not set its own
    #[serde(default)]
    pub credentials: Option<GoogleCredentials>,
}

impl GoogleConfig {
    /// Pick the service-specific credentials, falling back to the shared ones
    pub fn resolve<'a>(&'a self, service: Option<&'a GoogleCredentials>) -> Option<&'a GoogleCredentials> {
        service.or(self.credentials.as_ref())
    }
}

/// How a request to a Google API is authenticated
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoogleCredentials {
    /// API key, sent as `x-goog-api-key`
    ApiKey { key: SecretString },
    /// OAuth2 access token, sent as a bearer token
    AccessToken { token: SecretString },
    /// Service account key file (the JSON downloaded from the Cloud console),
    /// exchanged for short-lived access tokens
    ServiceAccount { path: PathBuf },
}

impl GoogleCredentials {
    /// Whether these credentials can authorize OAuth-only APIs such as `BigQuery`
    pub const fn is_oauth(&self) -> bool {
        matches!(self, Self::AccessToken { .. } | Self::ServiceAccount { .. })
    }
}
