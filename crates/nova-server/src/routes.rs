use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    routing::{get, post},
};
use extraction::ExtractionError;
use nova_telemetry::{KeyValue, metrics::record_duration};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use speech::ExtractUpload;
use warehouse::{Record, WarehouseError};

use crate::{
    error::ApiError,
    pipeline::{self, PipelineOutcome},
    state::AppState,
};

/// Application routes, plus the health probe at `health_path` when given
pub(crate) fn router(health_path: Option<&str>) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(home))
        .route("/transcribe-audio/", post(transcribe_audio))
        .route("/get-crm-records", get(get_crm_records))
        .route("/test-gemini", get(gemini_status).post(test_gemini));

    match health_path {
        Some(path) => router.route(path, get(health)),
        None => router,
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn home() -> Json<Value> {
    Json(json!({"message": "Nova Backend is running 🚀"}))
}

async fn transcribe_audio(
    State(state): State<AppState>,
    ExtractUpload(upload): ExtractUpload,
) -> Result<Json<PipelineOutcome>, ApiError> {
    tracing::debug!(
        filename = %upload.filename,
        content_type = %upload.content_type,
        bytes = upload.bytes.len(),
        "audio upload received"
    );

    let outcome = pipeline::run(&state, upload).await;

    state
        .metrics
        .count_request(if outcome.is_ok() { "success" } else { "error" });

    if let Err(ref e) = outcome {
        tracing::warn!(error = %e, "transcription pipeline failed");
    }

    outcome.map(Json)
}

#[derive(Debug, Deserialize)]
struct RecordsQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct RecordsResponse {
    records: Vec<Record>,
}

async fn get_crm_records(
    State(state): State<AppState>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let Query(query) = query.map_err(|e| WarehouseError::InvalidRequest(e.body_text()))?;
    let warehouse = state.warehouse.as_ref().ok_or(WarehouseError::NotConfigured)?;

    let start = Instant::now();
    let records = warehouse.list_records(query.limit).await;
    record_duration(
        &state.metrics.warehouse,
        start,
        &[KeyValue::new("operation", "query")],
    );

    Ok(Json(RecordsResponse { records: records? }))
}

async fn gemini_status() -> Json<Value> {
    Json(json!({"message": "Gemini API connected"}))
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct PromptResponse {
    response: String,
}

async fn test_gemini(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<PromptResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ExtractionError::InvalidRequest(e.body_text()))?;

    if request.prompt.trim().is_empty() {
        return Err(ExtractionError::InvalidRequest("prompt must not be empty".to_string()).into());
    }

    let generation = state.extractor.client().generate_text(&request.prompt).await?;

    Ok(Json(PromptResponse {
        response: generation.text,
    }))
}
