use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type so every endpoint
/// answers failures with the same body.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error kind (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

/// Failure body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub r#type: String,
}

/// Render a domain error as a JSON response
pub fn error_response<E: HttpError + ?Sized>(error: &E) -> Response {
    let body = ErrorBody {
        success: false,
        error: error.client_message(),
        r#type: error.error_type().to_string(),
    };

    (error.status_code(), Json(body)).into_response()
}

/// Failure to authenticate an outgoing Google API request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Service account key file missing, unreadable or malformed
    #[error("Service account key error: {0}")]
    KeyFile(String),

    /// Token endpoint refused the assertion
    #[error("Token exchange failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Token endpoint unreachable
    #[error("{0}")]
    Connection(String),
}
