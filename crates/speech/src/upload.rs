use axum::{
    body::Body,
    extract::{FromRef, FromRequest, Multipart},
};

use crate::error::SpeechError;

/// Name of the multipart field carrying the audio
const FILE_FIELD: &str = "file";

/// Filename used when the client sends none
const DEFAULT_FILENAME: &str = "audio.wav";

/// Largest accepted upload body in bytes
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// One uploaded audio file
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    /// Filename as sent by the client, never used as a path
    pub filename: String,
    pub content_type: String,
}

/// Extractor for a `multipart/form-data` audio upload
pub struct ExtractUpload(pub AudioUpload);

impl<S> FromRequest<S> for ExtractUpload
where
    S: Send + Sync,
    UploadLimit: FromRef<S>,
{
    type Rejection = SpeechError;

    async fn from_request(request: http::Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let UploadLimit(limit) = UploadLimit::from_ref(state);
        let (parts, body) = request.into_parts();

        let is_multipart = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            return Err(SpeechError::UnsupportedMediaType);
        }

        let declared_length = parts
            .headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());

        if declared_length.is_some_and(|len| len > limit) {
            return Err(SpeechError::UploadTooLarge(limit));
        }

        // A chunked body has no declared length, so the read itself enforces the limit
        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|_| SpeechError::UploadTooLarge(limit))?;

        let request = http::Request::from_parts(parts, Body::from(bytes));

        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| SpeechError::InvalidRequest(format!("Failed to parse multipart form: {e}")))?;

        let mut upload = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| SpeechError::InvalidRequest(format!("Failed to read multipart field: {e}")))?
        {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let filename = field
                .file_name()
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_FILENAME)
                .to_string();

            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let bytes = field
                .bytes()
                .await
                .map_err(|e| SpeechError::InvalidRequest(format!("Failed to read audio data: {e}")))?;

            upload = Some(AudioUpload {
                bytes: bytes.to_vec(),
                filename,
                content_type,
            });
        }

        let upload =
            upload.ok_or_else(|| SpeechError::InvalidRequest("Missing required 'file' field in multipart form".into()))?;

        if upload.bytes.is_empty() {
            return Err(SpeechError::InvalidRequest("Uploaded file is empty".into()));
        }

        Ok(Self(upload))
    }
}
