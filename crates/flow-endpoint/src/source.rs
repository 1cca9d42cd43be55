//! Where flow ids come from: the [`FlowIdSource`] seam and its HTTP implementation against
//! the configuration backend (`GET {backend}/api/chatbot/flow-id`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::EndpointFetchError;

/// Path of the discovery endpoint on the configuration backend.
pub const FLOW_ID_PATH: &str = "/api/chatbot/flow-id";

/// Bound on a single discovery request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of the current flow id. Object-safe so the resolver can hold `Arc<dyn FlowIdSource>`.
#[async_trait]
pub trait FlowIdSource: Send + Sync {
    /// Returns a non-empty flow id, or an error meaning "no update this cycle".
    async fn fetch_flow_id(&self) -> Result<String, EndpointFetchError>;
}

/// Body of the discovery endpoint. On backend-side failure it answers
/// `{"flow_id": null, "status": "error", "message": "..."}` with HTTP 200.
#[derive(Debug, Deserialize)]
struct FlowIdResponse {
    #[serde(default)]
    flow_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Fetches the flow id from the configuration backend over HTTP.
#[derive(Debug, Clone)]
pub struct BackendFlowIdSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl BackendFlowIdSource {
    /// Creates a source for `backend_base` (e.g. `http://localhost:8000`) with the default 5s timeout.
    pub fn new(backend_base: &str) -> Self {
        Self::with_client(Client::new(), backend_base)
    }

    /// Creates a source sharing an existing HTTP client.
    pub fn with_client(client: Client, backend_base: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", backend_base.trim_end_matches('/'), FLOW_ID_PATH),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FlowIdSource for BackendFlowIdSource {
    async fn fetch_flow_id(&self) -> Result<String, EndpointFetchError> {
        debug!(url = %self.url, "step: fetching flow id from backend");

        let response = self
            .client
            .get(&self.url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EndpointFetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: FlowIdResponse = response.json().await?;
        match body.flow_id.map(|id| id.trim().to_string()) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => {
                debug!(
                    status = ?body.status,
                    message = ?body.message,
                    "Backend answered without a flow id"
                );
                Err(EndpointFetchError::MissingFlowId)
            }
        }
    }
}
