use std::path::Path;

use crate::{Config, GoogleCredentials, TRANSCRIPT_PLACEHOLDER, is_valid_project_id, is_valid_table_id};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// expanded, the TOML is invalid, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server()?;
        self.validate_credentials()?;
        self.validate_generative()?;
        self.validate_warehouse()?;
        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        if self.server.upload_limit == 0 {
            anyhow::bail!("server.upload_limit must be greater than 0");
        }

        let health = &self.server.health;
        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        if let Some(ref cors) = self.server.cors
            && cors.credentials
            && (cors.origins.is_any() || cors.headers.is_any() || cors.methods.is_any())
        {
            anyhow::bail!("server.cors.credentials cannot be combined with wildcard origins, methods or headers");
        }

        Ok(())
    }

    fn validate_credentials(&self) -> anyhow::Result<()> {
        if self.google.resolve(self.speech.credentials.as_ref()).is_none() {
            anyhow::bail!("no credentials for speech: set [google.credentials] or [speech.credentials]");
        }

        if self.google.resolve(self.generative.credentials.as_ref()).is_none() {
            anyhow::bail!("no credentials for generative: set [google.credentials] or [generative.credentials]");
        }

        if let Some(ref warehouse) = self.warehouse {
            match self.google.resolve(warehouse.credentials.as_ref()) {
                None => anyhow::bail!("no credentials for warehouse: set [google.credentials] or [warehouse.credentials]"),
                Some(credentials) if !credentials.is_oauth() => {
                    anyhow::bail!("warehouse requires access_token or service_account credentials, API keys are not accepted")
                }
                Some(_) => {}
            }
        }

        let configured = [
            self.google.credentials.as_ref(),
            self.speech.credentials.as_ref(),
            self.generative.credentials.as_ref(),
            self.warehouse.as_ref().and_then(|w| w.credentials.as_ref()),
        ];

        for credentials in configured.into_iter().flatten() {
            if let GoogleCredentials::ServiceAccount { path } = credentials
                && !path.is_file()
            {
                anyhow::bail!("service account key file not found: {}", path.display());
            }
        }

        Ok(())
    }

    fn validate_generative(&self) -> anyhow::Result<()> {
        if self.generative.model.trim().is_empty() {
            anyhow::bail!("generative.model must not be empty");
        }

        if let Some(ref template) = self.generative.prompt_template
            && !template.contains(TRANSCRIPT_PLACEHOLDER)
        {
            anyhow::bail!("generative.prompt_template must contain the {TRANSCRIPT_PLACEHOLDER} placeholder");
        }

        Ok(())
    }

    fn validate_warehouse(&self) -> anyhow::Result<()> {
        let Some(ref warehouse) = self.warehouse else {
            return Ok(());
        };

        if !is_valid_project_id(&warehouse.project_id) {
            anyhow::bail!("invalid warehouse.project_id: `{}`", warehouse.project_id);
        }

        for (field, value) in [("dataset", &warehouse.dataset), ("table", &warehouse.table)] {
            if !is_valid_table_id(value) {
                anyhow::bail!("invalid warehouse.{field}: `{value}`");
            }
        }

        if warehouse.max_limit == 0 {
            anyhow::bail!("warehouse.max_limit must be greater than 0");
        }

        if warehouse.default_limit > warehouse.max_limit {
            anyhow::bail!("warehouse.default_limit cannot exceed warehouse.max_limit");
        }

        Ok(())
    }
}
