//! Common test utilities and fixtures
//!
//! A threaded mock backend the binary can report to, plus helpers for
//! writing throwaway config files.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;

/// A request captured by the backend
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub body: Value,
}

/// How the backend answers
#[derive(Debug, Clone)]
pub struct Responses {
    pub status: StatusCode,
    pub result: StatusCode,
    /// Leading requests answered with 503 regardless of path
    pub transient_failures: usize,
}

impl Default for Responses {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            result: StatusCode::OK,
            transient_failures: 0,
        }
    }
}

#[derive(Clone)]
struct BackendState {
    responses: Responses,
    failures_left: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl BackendState {
    fn answer(&self, path: &str, body: Value, code: StatusCode) -> StatusCode {
        self.received.lock().push(Received {
            path: path.to_string(),
            body,
        });
        let transient = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            code
        }
    }
}

async fn status_handler(State(state): State<BackendState>, Json(body): Json<Value>) -> StatusCode {
    let code = state.responses.status;
    state.answer("/executor/status", body, code)
}

async fn result_handler(State(state): State<BackendState>, Json(body): Json<Value>) -> StatusCode {
    let code = state.responses.result;
    state.answer("/executor/result", body, code)
}

/// Backend running on its own thread and runtime, so blocking
/// `assert_cmd` calls can run against it
pub struct TestBackend {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestBackend {
    pub fn start() -> Self {
        Self::with_responses(Responses::default())
    }

    pub fn with_codes(status: StatusCode, result: StatusCode) -> Self {
        Self::with_responses(Responses {
            status,
            result,
            ..Default::default()
        })
    }

    pub fn with_responses(responses: Responses) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            failures_left: Arc::new(AtomicUsize::new(responses.transient_failures)),
            responses,
            received: received.clone(),
        };
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let app = Router::new()
                    .route("/executor/status", post(status_handler))
                    .route("/executor/result", post(result_handler))
                    .with_state(state);
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = rx.await;
                    })
                    .await;
            });
        });

        Self {
            addr,
            received,
            shutdown: Some(tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().clone()
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A local URL nothing is listening on
pub fn unused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Write `config.json` into a fresh temp dir
pub fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Config pointing at `backend_url` with a fast three-step task
pub fn fast_task_config(backend_url: &str) -> String {
    serde_json::json!({
        "backend_url": backend_url,
        "http": {"retry_initial_delay_ms": 10, "retry_max_delay_ms": 50},
        "task": {
            "id": "it-task",
            "steps": [
                {"description": "Fetch inputs", "duration": 0.01},
                {"description": "Transform", "duration": 0.01},
                {"description": "Publish", "duration": 0.01}
            ],
            "result": {"status": "success", "output": {"rows": 3}}
        }
    })
    .to_string()
}
