use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nova_core::{AuthError, HttpError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WarehouseError>;

/// Warehouse errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// No `[warehouse]` section in the configuration
    #[error("Warehouse is not configured")]
    NotConfigured,

    /// Bad caller input (e.g. a zero limit)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// `BigQuery` rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// `BigQuery` returned a non-success status
    #[error("Warehouse API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The query did not finish within the configured timeout
    #[error("Query did not complete within {0} ms")]
    QueryTimeout(u64),

    /// The job finished with errors
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A result cell did not match its schema type
    #[error("Failed to decode query results: {0}")]
    Decode(String),

    /// `insertAll` rejected the row
    #[error("Insert rejected: {0}")]
    InsertRejected(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error, details are not shown to clients
    #[error("Internal server error")]
    InternalError,
}

impl WarehouseError {
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Self::QueryFailed(message),
            401 | 403 => Self::AuthenticationFailed(message),
            _ => Self::ProviderApiError { status, message },
        }
    }
}

impl From<AuthError> for WarehouseError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::KeyFile(message) => Self::ConfigError(message),
            AuthError::Rejected { .. } => Self::AuthenticationFailed(error.to_string()),
            AuthError::Connection(message) => Self::ConnectionError(message),
        }
    }
}

impl HttpError for WarehouseError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::QueryTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ProviderApiError { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AuthenticationFailed(_)
            | Self::ProviderApiError { .. }
            | Self::ConnectionError(_)
            | Self::QueryFailed(_)
            | Self::Decode(_)
            | Self::InsertRejected(_) => StatusCode::BAD_GATEWAY,
            Self::ConfigError(_) | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::NotConfigured => "not_configured_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::AuthenticationFailed(_) => "upstream_authentication_error",
            Self::ProviderApiError { .. }
            | Self::ConnectionError(_)
            | Self::QueryTimeout(_)
            | Self::QueryFailed(_)
            | Self::Decode(_)
            | Self::InsertRejected(_) => "warehouse_api_error",
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

impl IntoResponse for WarehouseError {
    fn into_response(self) -> Response {
        nova_core::error_response(&self)
    }
}
