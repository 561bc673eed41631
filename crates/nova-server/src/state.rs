use std::{path::PathBuf, sync::Arc};

use axum::extract::FromRef;
use extraction::Extractor;
use nova_telemetry::PipelineMetrics;
use speech::{Recognizer, UploadLimit};
use warehouse::Warehouse;

/// Shared state handed to every handler
#[derive(Clone)]
pub(crate) struct AppState {
    pub recognizer: Arc<Recognizer>,
    pub extractor: Arc<Extractor>,
    /// `None` when the config has no `[warehouse]` section
    pub warehouse: Option<Arc<Warehouse>>,
    pub upload_limit: UploadLimit,
    pub temp_dir: Option<PathBuf>,
    pub metrics: PipelineMetrics,
}

impl FromRef<AppState> for UploadLimit {
    fn from_ref(state: &AppState) -> Self {
        state.upload_limit
    }
}
