#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod generative;
pub mod google;
mod loader;
pub mod server;
pub mod speech;
pub mod telemetry;
pub mod warehouse;

use serde::Deserialize;

pub use cors::*;
pub use generative::*;
pub use google::*;
pub use server::*;
pub use speech::*;
pub use telemetry::{LogFormat, TelemetryConfig};
pub use warehouse::*;

/// Top-level Nova configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Credentials shared by every Google service
    #[serde(default)]
    pub google: GoogleConfig,
    /// Speech-to-text configuration
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Generative model configuration
    #[serde(default)]
    pub generative: GenerativeConfig,
    /// Warehouse configuration, the records endpoint is disabled without it
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
