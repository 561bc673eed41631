mod cors;
mod error;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use extraction::Extractor;
use nova_config::Config;
use nova_telemetry::PipelineMetrics;
use speech::{Recognizer, UploadLimit};
use tower_http::trace::TraceLayer;
use warehouse::Warehouse;

pub use error::ApiError;

use crate::state::AppState;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the speech, extraction or warehouse clients cannot
    /// be built from the configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let recognizer = Recognizer::from_config(&config)?;
        let extractor = Extractor::from_config(&config)?;
        let warehouse = Warehouse::from_config(&config)?;

        match warehouse {
            Some(ref warehouse) => tracing::debug!(
                table = %warehouse.table(),
                store_records = warehouse.stores_records(),
                "warehouse configured"
            ),
            None => tracing::debug!("no warehouse configured, records endpoint disabled"),
        }

        let upload_limit = config.server.upload_limit;

        let state = AppState {
            recognizer: Arc::new(recognizer),
            extractor: Arc::new(extractor),
            warehouse: warehouse.map(Arc::new),
            upload_limit: UploadLimit(upload_limit),
            temp_dir: config.server.temp_dir.clone(),
            metrics: PipelineMetrics::new(),
        };

        let health = &config.server.health;
        let mut app = routes::router(health.enabled.then_some(health.path.as_str())).with_state(state);

        // Multipart parsing honours this limit instead of axum's 2 MB default
        app = app.layer(DefaultBodyLimit::max(upload_limit));

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const CONFIG: &str = r#"
[google.credentials]
type = "api_key"
key = "AIza-test"
"#;

    fn router(raw: &str) -> Router {
        Server::new(Config::from_toml(raw).unwrap()).unwrap().into_router()
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn home_message() {
        let (status, body) = call(router(CONFIG), get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Nova Backend is running 🚀");
    }

    #[tokio::test]
    async fn health_can_be_disabled() {
        let response = router(CONFIG).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disabled = format!("{CONFIG}\n[server.health]\nenabled = false\n");
        let response = router(&disabled).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn records_without_warehouse() {
        let (status, body) = call(router(CONFIG), get("/get-crm-records")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["type"], "not_configured_error");
    }

    #[tokio::test]
    async fn records_bad_limit() {
        let (status, body) = call(router(CONFIG), get("/get-crm-records?limit=ten")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn gemini_status() {
        let (status, body) = call(router(CONFIG), get("/test-gemini")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Gemini API connected");
    }

    #[tokio::test]
    async fn empty_prompt_rejected() {
        let request = Request::post("/test-gemini")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"prompt": "  "}"#))
            .unwrap();
        let (status, body) = call(router(CONFIG), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn upload_must_be_multipart() {
        let request = Request::post("/transcribe-audio/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = call(router(CONFIG), request).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn default_listen_address() {
        let server = Server::new(Config::from_toml(CONFIG).unwrap()).unwrap();
        assert_eq!(server.listen_address(), SocketAddr::from(([0, 0, 0, 0], 8000)));
    }
}
