use axum::response::{IntoResponse, Response};
use extraction::ExtractionError;
use speech::SpeechError;
use thiserror::Error;
use warehouse::WarehouseError;

/// Any failure an endpoint can answer with
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Speech(e) => e.into_response(),
            Self::Extraction(e) => e.into_response(),
            Self::Warehouse(e) => e.into_response(),
        }
    }
}
