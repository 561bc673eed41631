use std::sync::Arc;

use nova_config::GoogleCredentials;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::{error::AuthError, http_client, token::ServiceAccountTokens};

/// Header carrying a Google API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Resolved credentials attached to every outgoing Google API request
#[derive(Debug, Clone)]
pub enum GoogleAuth {
    ApiKey(SecretString),
    AccessToken(SecretString),
    ServiceAccount(Arc<ServiceAccountTokens>),
}

impl GoogleAuth {
    /// Resolve configured credentials, loading the key file of a service account
    pub fn from_credentials(credentials: &GoogleCredentials) -> Result<Self, AuthError> {
        Ok(match credentials {
            GoogleCredentials::ApiKey { key } => Self::ApiKey(key.clone()),
            GoogleCredentials::AccessToken { token } => Self::AccessToken(token.clone()),
            GoogleCredentials::ServiceAccount { path } => {
                let tokens = ServiceAccountTokens::from_file(path, http_client())?;
                tracing::info!(client_email = tokens.client_email(), "loaded service account key");
                Self::ServiceAccount(Arc::new(tokens))
            }
        })
    }

    /// Whether these credentials can authorize OAuth-only APIs such as `BigQuery`
    pub const fn is_oauth(&self) -> bool {
        matches!(self, Self::AccessToken(_) | Self::ServiceAccount(_))
    }

    /// Attach the credentials to `request`, refreshing a service account token if needed
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        Ok(match self {
            Self::ApiKey(key) => request.header(API_KEY_HEADER, key.expose_secret()),
            Self::AccessToken(token) => request.bearer_auth(token.expose_secret()),
            Self::ServiceAccount(tokens) => request.bearer_auth(tokens.token().await?.expose_secret()),
        })
    }
}
