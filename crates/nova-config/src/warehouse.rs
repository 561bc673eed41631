use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::google::GoogleCredentials;

/// Warehouse (`BigQuery`) configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Credentials override; must be an access token
    #[serde(default)]
    pub credentials: Option<GoogleCredentials>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Google Cloud project that owns the dataset
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// Dataset holding the CRM table
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// CRM records table
    #[serde(default = "default_table")]
    pub table: String,
    /// Dataset location (e.g. "US", "EU")
    #[serde(default)]
    pub location: Option<String>,
    /// Rows returned when the caller gives no limit
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Upper bound for a caller-provided limit
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
    /// How long a query may run before the call gives up
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Insert every extracted record into the table
    #[serde(default)]
    pub store_records: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: None,
            project_id: default_project_id(),
            dataset: default_dataset(),
            table: default_table(),
            location: None,
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            timeout_ms: default_timeout_ms(),
            store_records: false,
        }
    }
}

/// Google Cloud project id rules: 6-30 chars, lowercase, digits and hyphens
pub fn is_valid_project_id(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]{4,28}[a-z0-9]$").expect("must be valid regex"))
        .is_match(value)
}

/// Dataset and table ids: letters, digits and underscores
pub fn is_valid_table_id(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{1,1024}$").expect("must be valid regex"))
        .is_match(value)
}

fn default_project_id() -> String {
    "nova-crm-project".to_string()
}

fn default_dataset() -> String {
    "nova_dataset".to_string()
}

fn default_table() -> String {
    "crm_records".to_string()
}

const fn default_limit() -> u32 {
    10
}

const fn default_max_limit() -> u32 {
    1000
}

const fn default_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids() {
        assert!(is_valid_project_id("nova-crm-project"));
        assert!(!is_valid_project_id("Nova-CRM"));
        assert!(!is_valid_project_id("short"));
        assert!(!is_valid_project_id("ends-with-"));
        assert!(!is_valid_project_id("nova`; DROP TABLE x; --"));
    }

    #[test]
    fn table_ids() {
        assert!(is_valid_table_id("crm_records"));
        assert!(is_valid_table_id("Dataset2025"));
        assert!(!is_valid_table_id(""));
        assert!(!is_valid_table_id("crm-records"));
        assert!(!is_valid_table_id("crm_records` LIMIT 1"));
    }
}
