//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use nova_config::{
    Config, CorsConfig, GoogleConfig, GoogleCredentials, ParseMode, ServerConfig, WarehouseConfig,
};
use secrecy::SecretString;

use super::mock_google::MockGoogle;

pub const TEST_API_KEY: &str = "AIza-test-key";
pub const TEST_ACCESS_TOKEN: &str = "ya29.test-token";
pub const SERVICE_ACCOUNT_EMAIL: &str = "nova-tests@nova-crm-project.iam.gserviceaccount.com";

const SERVICE_ACCOUNT_PEM: &str = include_str!("../../../../testdata/service-account-key.pem");

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config with every Google service pointed at the mock
    pub fn new(mock: &MockGoogle) -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                ..ServerConfig::default()
            },
            google: GoogleConfig {
                credentials: Some(GoogleCredentials::ApiKey {
                    key: SecretString::from(TEST_API_KEY),
                }),
            },
            ..Config::default()
        };

        config.speech.base_url = Some(mock.speech_url().parse().expect("valid URL"));
        config.generative.base_url = Some(mock.generative_url().parse().expect("valid URL"));

        Self { config }
    }

    /// Enable the warehouse against the mock, optionally storing every extraction
    pub fn with_warehouse(mut self, mock: &MockGoogle, store_records: bool) -> Self {
        self.config.warehouse = Some(WarehouseConfig {
            credentials: Some(GoogleCredentials::AccessToken {
                token: SecretString::from(TEST_ACCESS_TOKEN),
            }),
            base_url: Some(mock.warehouse_url().parse().expect("valid URL")),
            store_records,
            ..WarehouseConfig::default()
        });
        self
    }

    /// Enable the warehouse with a service account key written into `dir`,
    /// minting tokens at the mock's token endpoint
    pub fn with_service_account_warehouse(mut self, mock: &MockGoogle, dir: &Path) -> Self {
        let key = serde_json::json!({
            "type": "service_account",
            "project_id": "nova-crm-project",
            "private_key_id": "test-key-1",
            "private_key": SERVICE_ACCOUNT_PEM,
            "client_email": SERVICE_ACCOUNT_EMAIL,
            "token_uri": mock.token_url(),
        });

        let path = dir.join("service-account.json");
        std::fs::write(&path, key.to_string()).expect("write service account key");

        self.config.warehouse = Some(WarehouseConfig {
            credentials: Some(GoogleCredentials::ServiceAccount { path }),
            base_url: Some(mock.warehouse_url().parse().expect("valid URL")),
            ..WarehouseConfig::default()
        });
        self
    }

    /// Stage uploads in the given directory
    pub fn with_temp_dir(mut self, dir: &Path) -> Self {
        self.config.server.temp_dir = Some(dir.to_path_buf());
        self
    }

    /// Limit the upload body size
    pub fn with_upload_limit(mut self, limit: usize) -> Self {
        self.config.server.upload_limit = limit;
        self
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.config.generative.parse_mode = mode;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
