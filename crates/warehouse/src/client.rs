//! `BigQuery` REST client for the CRM table

use nova_config::{Config, WarehouseConfig};
use nova_core::{GoogleAuth, http_client, read_upstream_error};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    CrmRow, Record, TableRef,
    error::{Result, WarehouseError},
    insert::{ErrorProto, InsertAllRequest, InsertAllResponse, InsertRow, rejection_message},
    rows::{TableRow, TableSchema, decode_rows},
};

const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Reads and writes CRM records in one table
pub struct Warehouse {
    client: Client,
    base_url: String,
    auth: GoogleAuth,
    table: TableRef,
    location: Option<String>,
    default_limit: u32,
    max_limit: u32,
    timeout_ms: u64,
    store_records: bool,
}

impl Warehouse {
    /// Build the warehouse from configuration, `None` when it has no `[warehouse]` section
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(warehouse) = config.warehouse.as_ref() else {
            return Ok(None);
        };

        let credentials = config
            .google
            .resolve(warehouse.credentials.as_ref())
            .ok_or_else(|| WarehouseError::ConfigError("credentials required for warehouse".to_string()))?;

        Self::new(warehouse, GoogleAuth::from_credentials(credentials)?).map(Some)
    }

    pub fn new(config: &WarehouseConfig, auth: GoogleAuth) -> Result<Self> {
        if !auth.is_oauth() {
            return Err(WarehouseError::ConfigError(
                "warehouse requires access_token or service_account credentials".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .as_ref()
            .map_or(DEFAULT_BASE_URL, url::Url::as_str)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: http_client(),
            base_url,
            auth,
            table: TableRef::new(&config.project_id, &config.dataset, &config.table)?,
            location: config.location.clone(),
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            timeout_ms: config.timeout_ms,
            store_records: config.store_records,
        })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Whether extracted records should be inserted after each upload
    pub fn stores_records(&self) -> bool {
        self.store_records
    }

    /// Resolve a caller-provided limit against the configured default and cap
    pub fn effective_limit(&self, limit: Option<u32>) -> Result<u32> {
        match limit {
            Some(0) => Err(WarehouseError::InvalidRequest("limit must be at least 1".to_string())),
            Some(limit) => Ok(limit.min(self.max_limit)),
            None => Ok(self.default_limit),
        }
    }

    /// Fetch up to `limit` rows of the CRM table
    pub async fn list_records(&self, limit: Option<u32>) -> Result<Vec<Record>> {
        let limit = self.effective_limit(limit)?;
        let query = self.table.select_all(limit);

        let request = QueryRequest {
            query: &query,
            use_legacy_sql: false,
            timeout_ms: self.timeout_ms,
            max_results: limit,
            location: self.location.as_deref(),
            format_options: FormatOptions {
                use_int64_timestamp: true,
            },
        };

        let url = format!("{}/projects/{}/queries", self.base_url, self.table.project());

        tracing::debug!(table = %self.table, limit, "query request");

        let response: QueryResponse = self.post(&url, &request).await?;

        if !response.job_complete {
            tracing::warn!(table = %self.table, timeout_ms = self.timeout_ms, "query did not complete");
            return Err(WarehouseError::QueryTimeout(self.timeout_ms));
        }

        if !response.errors.is_empty() {
            let message = response
                .errors
                .iter()
                .map(ErrorProto::describe)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(WarehouseError::QueryFailed(message));
        }

        let schema = response.schema.unwrap_or_default();
        let records = decode_rows(&schema, response.rows)?;

        tracing::debug!(table = %self.table, rows = records.len(), "query complete");

        Ok(records)
    }

    /// Stream one row into the table, returning its insert id
    pub async fn insert_record(&self, row: &CrmRow) -> Result<String> {
        let insert_id = uuid::Uuid::new_v4().to_string();

        let request = InsertAllRequest {
            skip_invalid_rows: false,
            ignore_unknown_values: false,
            rows: vec![InsertRow {
                insert_id: insert_id.clone(),
                json: row,
            }],
        };

        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            self.base_url,
            self.table.project(),
            self.table.dataset(),
            self.table.table()
        );

        let response: InsertAllResponse = self.post(&url, &request).await?;

        if let Some(message) = rejection_message(&response) {
            tracing::warn!(table = %self.table, insert_id = %insert_id, error = %message, "row rejected");
            return Err(WarehouseError::InsertRejected(message));
        }

        tracing::debug!(table = %self.table, insert_id = %insert_id, "row inserted");

        Ok(insert_id)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self
            .auth
            .authorize(self.client.post(url))
            .await?
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(table = %self.table, error = %e, "upstream request failed");
                WarehouseError::ConnectionError(format!("Failed to send request to BigQuery: {e}"))
            })?;

        if !response.status().is_success() {
            let (status, message) = read_upstream_error(response).await;
            tracing::warn!(table = %self.table, status, "upstream returned error");
            return Err(WarehouseError::from_status(status, message));
        }

        response.json().await.map_err(|e| {
            tracing::error!(table = %self.table, error = %e, "failed to parse BigQuery response");
            WarehouseError::InternalError
        })
    }
}

// -- jobs.query wire types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    format_options: FormatOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatOptions {
    use_int64_timestamp: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default = "job_complete_default")]
    job_complete: bool,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

const fn job_complete_default() -> bool {
    true
}
