//! Mock Google APIs for integration tests
//!
//! Serves Speech-to-Text `speech:recognize`, Gemini `generateContent`, the
//! `BigQuery` `queries` / `insertAll` calls and the OAuth2 token endpoint with
//! canned, configurable answers

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Transcript returned by the default speech behavior
pub const DEFAULT_TRANSCRIPT: &str =
    "Had coffee with Sarah from Acme Corp. She wants the enterprise plan for 50,000 dollars.";

/// CRM JSON returned by the default model behavior
pub const DEFAULT_CRM_JSON: &str = r#"{
  "contact": {"name": "Sarah", "company": "Acme Corp", "email": "", "phone": "", "role": "VP of Sales"},
  "deal": {"stage": "qualified", "value": 50000, "products": ["Enterprise Plan"]},
  "interaction": {
    "summary": "Coffee meeting about the enterprise plan.",
    "action_items": ["Send proposal by next Friday"],
    "next_steps": ["Prepare enterprise proposal"],
    "follow_up_date": "Next Friday",
    "sentiment": "positive"
  }
}"#;

/// How the mock answers each API
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// `None` answers with no recognition results
    pub transcript: Option<String>,
    pub speech_status: Option<StatusCode>,
    pub model_text: String,
    pub model_status: Option<StatusCode>,
    pub job_complete: bool,
    /// Per-row insert error reason
    pub insert_error: Option<String>,
    pub token_status: Option<StatusCode>,
    /// Lifetime reported for minted access tokens
    pub token_expires_in: u64,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            transcript: Some(DEFAULT_TRANSCRIPT.to_owned()),
            speech_status: None,
            model_text: DEFAULT_CRM_JSON.to_owned(),
            model_status: None,
            job_complete: true,
            insert_error: None,
            token_status: None,
            token_expires_in: 3600,
        }
    }
}

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
    pub api_key: Option<String>,
    pub authorization: Option<String>,
}

/// Mock Google backend
pub struct MockGoogle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    behavior: MockBehavior,
    recognize_count: AtomicU32,
    generate_count: AtomicU32,
    query_count: AtomicU32,
    insert_count: AtomicU32,
    token_count: AtomicU32,
    requests: Mutex<HashMap<&'static str, Vec<RecordedRequest>>>,
}

impl MockState {
    fn record(&self, kind: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);

        let request = RecordedRequest {
            path,
            body,
            api_key: header("x-goog-api-key"),
            authorization: header("authorization"),
        };

        self.requests
            .lock()
            .expect("mock state poisoned")
            .entry(kind)
            .or_default()
            .push(request);
    }
}

impl MockGoogle {
    /// Start the mock with default behavior
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockBehavior::default()).await
    }

    /// Start the mock with custom behavior
    pub async fn start_with(behavior: MockBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            behavior,
            recognize_count: AtomicU32::new(0),
            generate_count: AtomicU32::new(0),
            query_count: AtomicU32::new(0),
            insert_count: AtomicU32::new(0),
            token_count: AtomicU32::new(0),
            requests: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/speech/v1/speech:recognize", routing::post(handle_recognize))
            .route("/gemini/v1beta/models/{call}", routing::post(handle_generate))
            .route("/bigquery/v2/projects/{project}/queries", routing::post(handle_query))
            .route(
                "/bigquery/v2/projects/{project}/datasets/{dataset}/tables/{table}/insertAll",
                routing::post(handle_insert),
            )
            .route("/oauth2/token", routing::post(handle_token))
            .layer(DefaultBodyLimit::disable())
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    pub fn speech_url(&self) -> String {
        format!("http://{}/speech/v1", self.addr)
    }

    pub fn generative_url(&self) -> String {
        format!("http://{}/gemini/v1beta", self.addr)
    }

    pub fn warehouse_url(&self) -> String {
        format!("http://{}/bigquery/v2", self.addr)
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/oauth2/token", self.addr)
    }

    pub fn recognize_count(&self) -> u32 {
        self.state.recognize_count.load(Ordering::Relaxed)
    }

    pub fn generate_count(&self) -> u32 {
        self.state.generate_count.load(Ordering::Relaxed)
    }

    pub fn query_count(&self) -> u32 {
        self.state.query_count.load(Ordering::Relaxed)
    }

    pub fn insert_count(&self) -> u32 {
        self.state.insert_count.load(Ordering::Relaxed)
    }

    pub fn token_count(&self) -> u32 {
        self.state.token_count.load(Ordering::Relaxed)
    }

    /// Most recent request of a kind: `recognize`, `generate`, `query`, `insert` or `token`
    pub fn last_request(&self, kind: &str) -> Option<RecordedRequest> {
        self.state
            .requests
            .lock()
            .expect("mock state poisoned")
            .get(kind)
            .and_then(|requests| requests.last().cloned())
    }
}

impl Drop for MockGoogle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn google_error(status: StatusCode) -> Response {
    let body = json!({
        "error": {
            "code": status.as_u16(),
            "message": "mock failure",
            "status": status.canonical_reason().unwrap_or("ERROR").to_uppercase().replace(' ', "_")
        }
    });

    (status, Json(body)).into_response()
}

async fn handle_recognize(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.recognize_count.fetch_add(1, Ordering::Relaxed);
    state.record("recognize", "speech:recognize".to_owned(), &headers, body);

    if let Some(status) = state.behavior.speech_status {
        return google_error(status);
    }

    match state.behavior.transcript {
        Some(ref transcript) => Json(json!({
            "results": [{"alternatives": [{"transcript": transcript, "confidence": 0.93}]}],
            "totalBilledTime": "4s"
        }))
        .into_response(),
        None => Json(json!({"totalBilledTime": "4s"})).into_response(),
    }
}

async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !call.ends_with(":generateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }

    state.generate_count.fetch_add(1, Ordering::Relaxed);
    state.record("generate", call, &headers, body);

    if let Some(status) = state.behavior.model_status {
        return google_error(status);
    }

    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": state.behavior.model_text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 60, "totalTokenCount": 180}
    }))
    .into_response()
}

async fn handle_query(
    State(state): State<Arc<MockState>>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.query_count.fetch_add(1, Ordering::Relaxed);
    let max_results = body["maxResults"].as_u64().unwrap_or(u64::MAX);
    state.record("query", format!("projects/{project}/queries"), &headers, body);

    if !state.behavior.job_complete {
        return Json(json!({
            "kind": "bigquery#queryResponse",
            "jobReference": {"projectId": project, "jobId": "job_mock"},
            "jobComplete": false
        }))
        .into_response();
    }

    let rows: Vec<Value> = [
        ("Sarah", "50000.0", vec!["Enterprise Plan"], "1700000000000000"),
        ("Tom", "1250.5", vec![], "1700003600000000"),
    ]
    .into_iter()
    .take(usize::try_from(max_results).unwrap_or(usize::MAX))
    .map(|(name, value, products, created_at)| {
        json!({"f": [
            {"v": name},
            {"v": value},
            {"v": products.into_iter().map(|p| json!({"v": p})).collect::<Vec<_>>()},
            {"v": created_at}
        ]})
    })
    .collect();

    Json(json!({
        "kind": "bigquery#queryResponse",
        "schema": {"fields": [
            {"name": "contact_name", "type": "STRING", "mode": "NULLABLE"},
            {"name": "deal_value", "type": "FLOAT", "mode": "NULLABLE"},
            {"name": "products", "type": "STRING", "mode": "REPEATED"},
            {"name": "created_at", "type": "TIMESTAMP", "mode": "NULLABLE"}
        ]},
        "jobReference": {"projectId": project, "jobId": "job_mock"},
        "totalRows": rows.len().to_string(),
        "rows": rows,
        "jobComplete": true
    }))
    .into_response()
}

async fn handle_insert(
    State(state): State<Arc<MockState>>,
    Path((project, dataset, table)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.insert_count.fetch_add(1, Ordering::Relaxed);
    state.record(
        "insert",
        format!("projects/{project}/datasets/{dataset}/tables/{table}/insertAll"),
        &headers,
        body,
    );

    match state.behavior.insert_error {
        Some(ref reason) => Json(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [{"index": 0, "errors": [
                {"reason": reason, "location": "deal_value", "message": "mock rejection"}
            ]}]
        }))
        .into_response(),
        None => Json(json!({"kind": "bigquery#tableDataInsertAllResponse"})).into_response(),
    }
}

/// Token exchange; the form body is recorded as a JSON object
async fn handle_token(State(state): State<Arc<MockState>>, headers: HeaderMap, body: String) -> Response {
    let count = state.token_count.fetch_add(1, Ordering::Relaxed) + 1;

    let form: serde_json::Map<String, Value> = body
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_owned(), Value::String(value.replace("%3A", ":"))))
        .collect();
    state.record("token", "oauth2/token".to_owned(), &headers, Value::Object(form));

    if let Some(status) = state.behavior.token_status {
        return (
            status,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."})),
        )
            .into_response();
    }

    Json(json!({
        "access_token": format!("ya29.mock-{count}"),
        "expires_in": state.behavior.token_expires_in,
        "token_type": "Bearer"
    }))
    .into_response()
}
