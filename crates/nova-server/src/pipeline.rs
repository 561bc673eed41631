//! Voice note to CRM record: stage, recognize, extract, store

use std::time::Instant;

use extraction::CrmData;
use nova_telemetry::{KeyValue, metrics::record_duration};
use serde::Serialize;
use speech::{AudioUpload, StagedAudio};
use warehouse::CrmRow;

use crate::{error::ApiError, state::AppState};

/// Body of a successful `/transcribe-audio/` call
#[derive(Debug, Serialize)]
pub(crate) struct PipelineOutcome {
    pub success: bool,
    pub transcript: String,
    /// `null` when no speech was detected
    pub data: Option<CrmData>,
    pub stored: bool,
}

pub(crate) async fn run(state: &AppState, upload: AudioUpload) -> Result<PipelineOutcome, ApiError> {
    let staged = StagedAudio::stage(&upload, state.temp_dir.as_deref()).await?;
    drop(upload);

    let encoding = staged.encoding();
    let start = Instant::now();
    let recognized = state.recognizer.recognize(&staged).await;
    record_duration(&state.metrics.speech, start, &[KeyValue::new("encoding", encoding.as_str())]);

    // The temp file goes away before anything else happens
    drop(staged);
    let transcript = recognized?;

    if !transcript.detected_speech {
        tracing::info!(?encoding, "no speech detected, skipping extraction");
        return Ok(PipelineOutcome {
            success: true,
            transcript: transcript.text,
            data: None,
            stored: false,
        });
    }

    let start = Instant::now();
    let extracted = state.extractor.extract(&transcript.text).await;
    record_duration(&state.metrics.extraction, start, &[]);
    let data = extracted?;

    let stored = store(state, &transcript.text, &data).await;

    Ok(PipelineOutcome {
        success: true,
        transcript: transcript.text,
        data: Some(data),
        stored,
    })
}

/// Insert the record when storage is enabled; failures are logged, never returned
async fn store(state: &AppState, transcript: &str, data: &CrmData) -> bool {
    let Some(warehouse) = state.warehouse.as_ref().filter(|w| w.stores_records()) else {
        return false;
    };

    let row = CrmRow::from_extraction(transcript, data);
    let start = Instant::now();
    let result = warehouse.insert_record(&row).await;
    record_duration(
        &state.metrics.warehouse,
        start,
        &[KeyValue::new("operation", "insert")],
    );

    match result {
        Ok(insert_id) => {
            tracing::info!(table = %warehouse.table(), %insert_id, "record stored");
            true
        }
        Err(e) => {
            tracing::warn!(table = %warehouse.table(), error = %e, "failed to store record");
            false
        }
    }
}
