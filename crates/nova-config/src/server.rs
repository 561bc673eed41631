use std::{net::SocketAddr, path::PathBuf};

use serde::Deserialize;

use crate::cors::CorsConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// Largest accepted upload body in bytes
    #[serde(default = "default_upload_limit")]
    pub upload_limit: usize,
    /// Where uploads are staged; the system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: Option<CorsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            upload_limit: default_upload_limit(),
            temp_dir: None,
            health: HealthConfig::default(),
            cors: None,
        }
    }
}

/// Liveness probe answering `ok`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_health_path")]
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_health_path(),
        }
    }
}

const fn default_upload_limit() -> usize {
    32 << 20
}

const fn default_true() -> bool {
    true
}

fn default_health_path() -> String {
    "/health".to_string()
}
