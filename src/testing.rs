//! Mock backend for unit tests
//!
//! Records every report in arrival order and answers with configurable
//! status codes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::protocol::{RESULT_ENDPOINT, STATUS_ENDPOINT};

/// A request captured by the mock backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: serde_json::Value,
}

/// How the mock backend answers
#[derive(Debug, Clone)]
pub struct MockResponses {
    /// Code for `/executor/status`
    pub status: StatusCode,
    /// Code for `/executor/result`
    pub result: StatusCode,
    /// Number of leading requests answered with 503 regardless of path
    pub transient_failures: usize,
}

impl Default for MockResponses {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            result: StatusCode::OK,
            transient_failures: 0,
        }
    }
}

#[derive(Clone)]
struct MockState {
    responses: MockResponses,
    failures_left: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockState {
    fn record(&self, path: &str, body: serde_json::Value, code: StatusCode) -> StatusCode {
        self.requests.lock().push(RecordedRequest {
            path: path.to_string(),
            body,
        });

        let took_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if took_failure {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            code
        }
    }
}

async fn handle_status(
    State(state): State<MockState>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let code = state.responses.status;
    state.record(STATUS_ENDPOINT, body, code)
}

async fn handle_result(
    State(state): State<MockState>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let code = state.responses.result;
    state.record(RESULT_ENDPOINT, body, code)
}

/// In-process backend bound to an ephemeral local port
pub struct MockBackend {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Start serving on the current runtime
    pub async fn start(responses: MockResponses) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = MockState {
            failures_left: Arc::new(AtomicUsize::new(responses.transient_failures)),
            responses,
            requests: requests.clone(),
        };
        let app = Router::new()
            .route(STATUS_ENDPOINT, post(handle_status))
            .route(RESULT_ENDPOINT, post(handle_result))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL to put in `backend_url`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A local URL nothing is listening on
pub async fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
