//! OAuth2 access tokens minted from a service account key
//!
//! The key signs an RS256 JWT assertion which the token endpoint trades for a
//! bearer token. Tokens are cached until shortly before they expire.

use std::{
    fmt,
    path::Path,
    time::{Duration, Instant},
};

use jwt_compact::{AlgorithmExt, Claims, Header, alg::Rsa};
use reqwest::Client;
use rsa::{RsaPrivateKey, pkcs8::DecodePrivateKey};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{error::AuthError, google::read_upstream_error};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Speech, Gemini and `BigQuery` all accept the cloud-platform scope
const TOKEN_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Longest assertion lifetime the token endpoint accepts
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are renewed this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service account key file that token minting needs
#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Claims of the JWT assertion sent to the token endpoint
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    3600
}

/// Mints and caches access tokens for one service account
pub struct ServiceAccountTokens {
    client: Client,
    client_email: String,
    key_id: Option<String>,
    signing_key: RsaPrivateKey,
    token_uri: String,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokens")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokens {
    /// Load a key file as downloaded from the Cloud console
    pub fn from_file(path: &Path, client: Client) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AuthError::KeyFile(format!("failed to read {}: {e}", path.display())))?;

        let key: ServiceAccountKey = serde_json::from_str(&contents)
            .map_err(|e| AuthError::KeyFile(format!("{} is not a service account key: {e}", path.display())))?;

        Self::from_key(key, client)
    }

    pub fn from_key(key: ServiceAccountKey, client: Client) -> Result<Self, AuthError> {
        let signing_key = RsaPrivateKey::from_pkcs8_pem(key.private_key.expose_secret())
            .map_err(|e| AuthError::KeyFile(format!("invalid private key for {}: {e}", key.client_email)))?;

        Ok(Self {
            client,
            client_email: key.client_email,
            key_id: key.private_key_id,
            signing_key,
            token_uri: key.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// A valid access token, exchanging a fresh assertion when the cached one is stale
    ///
    /// The lock is held across the exchange so concurrent callers wait for one
    /// refresh instead of each minting their own.
    pub async fn token(&self) -> Result<SecretString, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(ref token) = *cached
            && Instant::now() < token.refresh_at
        {
            return Ok(token.token.clone());
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);

        Ok(token)
    }

    async fn exchange(&self) -> Result<CachedToken, AuthError> {
        let assertion = self.assertion(jiff::Timestamp::now())?;

        tracing::debug!(client_email = %self.client_email, "exchanging service account assertion");

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(client_email = %self.client_email, error = %e, "token request failed");
                AuthError::Connection(format!("Failed to reach the token endpoint: {e}"))
            })?;

        if !response.status().is_success() {
            let (status, message) = read_upstream_error(response).await;
            tracing::warn!(client_email = %self.client_email, status, "token endpoint rejected the assertion");
            return Err(AuthError::Rejected { status, message });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Rejected {
                status: 200,
                message: format!("unreadable token response: {e}"),
            })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            token: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }

    /// Signed RS256 assertion issued at `now`
    pub(crate) fn assertion(&self, now: jiff::Timestamp) -> Result<String, AuthError> {
        let issued_at = now.as_second();

        let claims = Claims::new(AssertionClaims {
            iss: self.client_email.clone(),
            scope: TOKEN_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        });

        let header = match self.key_id {
            Some(ref key_id) => Header::empty().with_key_id(key_id.clone()),
            None => Header::empty(),
        };

        Rsa::rs256()
            .token(&header, &claims, &self.signing_key)
            .map_err(|e| AuthError::KeyFile(format!("failed to sign assertion: {e}")))
    }
}
