//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use pizza_telemetry::config::ServiceConfig;

/// One POST received by the mock telemetry backend.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Received {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct BackendState {
    received: Arc<Mutex<Vec<Received>>>,
    status: StatusCode,
}

/// A telemetry backend bound to a random loopback port.
pub struct MockBackend {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
}

#[allow(dead_code)]
impl MockBackend {
    /// Start a backend answering every POST with `status`.
    pub async fn start(status: StatusCode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState { received: received.clone(), status };

        let app = Router::new()
            .route("/metrics", post(record))
            .route("/logs", post(record))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, received }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn received(&self, path: &str) -> Vec<Received> {
        self.received
            .lock()
            .await
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Poll until at least `count` posts reached `path`.
    pub async fn wait_for(&self, path: &str, count: usize) -> Vec<Received> {
        for _ in 0..100 {
            let received = self.received(path).await;
            if received.len() >= count {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("backend never received {count} posts on {path}");
    }
}

async fn record(
    State(state): State<BackendState>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    state.received.lock().await.push(Received {
        path: uri.path().to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body,
    });
    state.status
}

/// Service configuration pointing both endpoints at `backend`.
pub fn config_for(backend: &MockBackend) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.metrics.url = backend.url("/metrics");
    config.metrics.source = "pizza-test".into();
    config.metrics.user_id = "42".into();
    config.metrics.api_key = "metrics-key".into();
    config.logging.url = backend.url("/logs");
    config.logging.source = "pizza-test".into();
    config.logging.user_id = "43".into();
    config.logging.api_key = "logs-key".into();
    config.telemetry.timeout_secs = 2;
    config
}
