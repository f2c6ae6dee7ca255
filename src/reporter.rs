//! Report delivery to the backend
//!
//! `ReportSink` is the seam between the task runner and the transport.
//! `HttpReporter` posts JSON to the backend and treats any non-2xx answer
//! as a failed delivery.

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::{ExecutorConfig, HttpSettings};
use crate::error::{Error, Result};
use crate::protocol::{ResultReport, StatusUpdate, RESULT_ENDPOINT, STATUS_ENDPOINT};

/// Destination for task reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Deliver one progress report
    async fn send_status(&self, update: &StatusUpdate) -> Result<()>;

    /// Deliver the final report
    async fn send_result(&self, report: &ResultReport) -> Result<()>;
}

/// Posts reports to `{backend_url}/executor/...`
pub struct HttpReporter {
    client: Client,
    base_url: String,
    http: HttpSettings,
}

impl HttpReporter {
    /// Create a reporter for the configured backend
    pub fn new(config: &ExecutorConfig) -> Result<Self> {
        Self::with_settings(config.base_url(), config.http.clone())
    }

    /// Create a reporter for an explicit base URL
    pub fn with_settings(base_url: &str, http: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Full URL for an endpoint path
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// POST a payload, retrying transient failures when configured to
    async fn post_json<T: Serialize + Sync>(&self, endpoint: &str, payload: &T) -> Result<()> {
        let url = self.endpoint_url(endpoint);
        let mut backoff = ExponentialBackoff {
            current_interval: self.http.retry_initial_delay(),
            initial_interval: self.http.retry_initial_delay(),
            max_interval: self.http.retry_max_delay(),
            max_elapsed_time: None,
            ..Default::default()
        };
        let mut attempt: u32 = 0;

        loop {
            match self.post_once(&url, payload).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.http.max_retries => {
                    attempt += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.http.retry_max_delay());
                    warn!(
                        url = %url,
                        attempt,
                        max_retries = self.http.max_retries,
                        ?delay,
                        error = %e,
                        "Retrying report delivery"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(url = %url, error = %e.format_for_log(), "POST failed");
                    return Err(e);
                }
            }
        }
    }

    async fn post_once<T: Serialize + Sync>(&self, url: &str, payload: &T) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::from_transport(url, &e))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(url = %url, status = status.as_u16(), error = %e, "Could not read response body");
                String::new()
            }
        };

        if status.is_success() {
            debug!(url = %url, status = status.as_u16(), body = %body, "POST succeeded");
            Ok(())
        } else {
            Err(Error::backend_rejected(url, status.as_u16(), body))
        }
    }
}

#[async_trait]
impl ReportSink for HttpReporter {
    async fn send_status(&self, update: &StatusUpdate) -> Result<()> {
        self.post_json(STATUS_ENDPOINT, update).await
    }

    async fn send_result(&self, report: &ResultReport) -> Result<()> {
        self.post_json(RESULT_ENDPOINT, report).await
    }
}
