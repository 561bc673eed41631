use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nova_core::{AuthError, HttpError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Generative model and parsing errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The caller's prompt was unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model API rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Model API returned a non-success status
    #[error("Generative API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The model produced no usable candidate
    #[error("Model returned no content: {0}")]
    EmptyResponse(String),

    /// The model's text could not be turned into CRM data
    #[error("Malformed model output: {0}")]
    MalformedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error, details are not shown to clients
    #[error("Internal server error")]
    InternalError,
}

impl ExtractionError {
    /// Map an upstream failure
    ///
    /// Gemini answers a bad API key with 400, so an upstream 400 is a
    /// gateway failure rather than the caller's fault.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(message),
            _ => Self::ProviderApiError { status, message },
        }
    }
}

impl From<AuthError> for ExtractionError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::KeyFile(message) => Self::ConfigError(message),
            AuthError::Rejected { .. } => Self::AuthenticationFailed(error.to_string()),
            AuthError::Connection(message) => Self::ConnectionError(message),
        }
    }
}

impl HttpError for ExtractionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProviderApiError { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AuthenticationFailed(_)
            | Self::ProviderApiError { .. }
            | Self::ConnectionError(_)
            | Self::EmptyResponse(_)
            | Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::ConfigError(_) | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::AuthenticationFailed(_) => "upstream_authentication_error",
            Self::ProviderApiError { .. } | Self::ConnectionError(_) => "generative_api_error",
            Self::EmptyResponse(_) | Self::MalformedResponse(_) => "extraction_error",
            Self::ConfigError(_) | Self::InternalError => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::ConfigError(_) | Self::InternalError => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        nova_core::error_response(&self)
    }
}
