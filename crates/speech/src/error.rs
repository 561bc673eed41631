use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nova_core::{AuthError, HttpError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpeechError>;

/// Speech-to-text errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The upload was rejected
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upload body is larger than the configured limit
    #[error("Upload exceeds the {0} byte limit")]
    UploadTooLarge(usize),

    /// Request is not `multipart/form-data`
    #[error("Unsupported Content-Type, expected: 'Content-Type: multipart/form-data'")]
    UnsupportedMediaType,

    /// Recognizer rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Recognizer returned a non-success status
    #[error("Speech API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing, reading or removing the temporary file failed
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    /// Internal server error
    /// If Some(message), it came from the recognizer and can be shown
    /// If None, it's an internal error and should not leak details
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl SpeechError {
    /// Map an upstream failure; the request is built here, so a 400 is ours, not the caller's
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(message),
            _ => Self::ProviderApiError { status, message },
        }
    }
}

impl From<AuthError> for SpeechError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::KeyFile(message) => Self::ConfigError(message),
            AuthError::Rejected { .. } => Self::AuthenticationFailed(error.to_string()),
            AuthError::Connection(message) => Self::ConnectionError(message),
        }
    }
}

impl HttpError for SpeechError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::AuthenticationFailed(_) | Self::ConnectionError(_) => StatusCode::BAD_GATEWAY,
            Self::ProviderApiError { status, .. } => match *status {
                429 => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::ConfigError(_) | Self::Staging(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) | Self::UploadTooLarge(_) | Self::UnsupportedMediaType => "invalid_request_error",
            Self::AuthenticationFailed(_) => "upstream_authentication_error",
            Self::ConnectionError(_) | Self::ProviderApiError { .. } => "speech_api_error",
            Self::ConfigError(_) | Self::Staging(_) | Self::InternalError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InternalError(Some(message)) => message.clone(),
            Self::ConfigError(_) | Self::Staging(_) | Self::InternalError(None) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for SpeechError {
    fn into_response(self) -> Response {
        nova_core::error_response(&self)
    }
}
