#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod auth;
mod error;
mod google;
mod http_client;
mod token;

pub use auth::GoogleAuth;
pub use error::{AuthError, ErrorBody, HttpError, error_response};
pub use google::{google_error_message, read_upstream_error};
pub use http_client::http_client;
pub use token::{ServiceAccountKey, ServiceAccountTokens};
