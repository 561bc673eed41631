//! Metric names and the pipeline instruments

use std::time::Instant;

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

// Pipeline stage metric names
pub const SPEECH_DURATION: &str = "nova.speech.duration";
pub const EXTRACTION_DURATION: &str = "nova.extraction.duration";
pub const WAREHOUSE_DURATION: &str = "nova.warehouse.duration";
pub const PIPELINE_REQUEST_COUNT: &str = "nova.pipeline.request.count";

/// Record a duration measurement on a histogram
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[KeyValue]) {
    let duration = start.elapsed().as_secs_f64();
    histogram.record(duration, attributes);
}

/// Instruments for the transcription pipeline
///
/// Built from the global meter provider, so they are no-ops until
/// [`crate::init`] installs an exporter.
#[derive(Clone)]
pub struct PipelineMetrics {
    pub speech: Histogram<f64>,
    pub extraction: Histogram<f64>,
    pub warehouse: Histogram<f64>,
    pub requests: Counter<u64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        let meter = global::meter("nova");

        Self {
            speech: meter
                .f64_histogram(SPEECH_DURATION)
                .with_unit("s")
                .with_description("Speech recognition latency")
                .build(),
            extraction: meter
                .f64_histogram(EXTRACTION_DURATION)
                .with_unit("s")
                .with_description("CRM extraction latency")
                .build(),
            warehouse: meter
                .f64_histogram(WAREHOUSE_DURATION)
                .with_unit("s")
                .with_description("Warehouse call latency")
                .build(),
            requests: meter
                .u64_counter(PIPELINE_REQUEST_COUNT)
                .with_description("Transcription requests by outcome")
                .build(),
        }
    }

    /// Count one finished pipeline run
    pub fn count_request(&self, outcome: &'static str) {
        self.requests.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
