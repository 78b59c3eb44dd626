pub mod error;
pub mod exposition;
pub mod types;

pub use error::{PipelineError, Result};
pub use exposition::counter_value;
pub use types::{QueueDepth, QueueSnapshot};

use std::time::Duration;

const QUEUE_STATUS_PATH: &str = "/api/v1/status/queues";
const METRICS_PATH: &str = "/metrics";
const API_KEY_HEADER: &str = "X-API-Key";

/// Connection settings for the pipeline API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Read-only client for the queue-status and metrics endpoints.
#[derive(Clone)]
pub struct PipelineClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PipelineClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }

    /// Depth of every backend queue.
    pub async fn queue_status(&self) -> Result<QueueSnapshot> {
        let body = self.get(QUEUE_STATUS_PATH).await?.text().await?;
        let snapshot: QueueSnapshot = serde_json::from_str(&body)?;
        tracing::debug!(queues = snapshot.queues.len(), "Fetched queue status");
        Ok(snapshot)
    }

    /// Raw exposition text from `/metrics`.
    pub async fn metrics_text(&self) -> Result<String> {
        Ok(self.get(METRICS_PATH).await?.text().await?)
    }

    /// Current value of one counter from `/metrics`.
    pub async fn counter(&self, metric_name: &str) -> Result<u64> {
        let text = self.metrics_text().await?;
        counter_value(&text, metric_name)
            .ok_or_else(|| PipelineError::MetricMissing(metric_name.to_string()))
    }
}
