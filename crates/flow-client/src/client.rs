//! HTTP client for the flow runtime: `POST /api/v1/run/{flow_id}` and the version health probe.

use std::time::Duration;

use async_trait::async_trait;
use flow_endpoint::SharedFlowEndpoint;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::context::{annotate_message, UserContext};
use crate::error::ChatError;
use crate::extract::extract_reply_with_slot;

const RUN_PATH: &str = "/api/v1/run";
const VERSION_PATH: &str = "/api/v1/version";

/// Sends one utterance and returns one plain-text reply.
///
/// Object-safe so callers can hold `Arc<dyn ChatTransport>` and tests can stub the runtime.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        text: &str,
        session_id: &str,
        user_context: Option<&UserContext>,
    ) -> Result<String, ChatError>;
}

/// Body of a run request. Built per call, never stored.
#[derive(Debug, Serialize)]
pub struct OutboundRequest<'a> {
    pub input_value: String,
    pub session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context: Option<&'a UserContext>,
}

impl<'a> OutboundRequest<'a> {
    /// Builds the body, prefixing the identity preamble for authenticated users.
    pub fn new(text: &str, session_id: &'a str, user_context: Option<&'a UserContext>) -> Self {
        Self {
            input_value: annotate_message(text, user_context),
            session_id,
            user_context,
        }
    }
}

/// Flow runtime client. Reads the flow id from the shared endpoint on every send; never writes it.
#[derive(Debug, Clone)]
pub struct FlowRuntimeClient {
    client: Client,
    base_url: String,
    endpoint: SharedFlowEndpoint,
    send_timeout: Option<Duration>,
}

impl FlowRuntimeClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8080`). Sends carry no timeout by default.
    pub fn new(base_url: &str, endpoint: SharedFlowEndpoint) -> Self {
        Self::with_client(Client::new(), base_url, endpoint)
    }

    pub fn with_client(client: Client, base_url: &str, endpoint: SharedFlowEndpoint) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint,
            send_timeout: None,
        }
    }

    /// Bounds each send. Conversational replies can be slow, so pick generously.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> &SharedFlowEndpoint {
        &self.endpoint
    }

    /// Run URL for `flow_id`.
    pub fn run_url(&self, flow_id: &str) -> String {
        format!("{}{}/{}", self.base_url, RUN_PATH, flow_id)
    }

    /// Health probe: true only for a 200 from `/api/v1/version`. Never gates sends.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}{}", self.base_url, VERSION_PATH);
        match self.client.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!(error = %e, url = %url, "Flow runtime health check failed");
                false
            }
        }
    }

    async fn post_run(
        &self,
        text: &str,
        session_id: &str,
        user_context: Option<&UserContext>,
    ) -> Result<String, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation);
        }

        let flow_id = self.endpoint.current_id();
        let url = self.run_url(&flow_id);
        let body = OutboundRequest::new(text, session_id, user_context);

        info!(
            flow_id = %flow_id,
            session_id = %session_id,
            text_len = text.len(),
            with_context = body.input_value.len() != text.len(),
            "step: flow runtime run request"
        );

        let mut request = self.client.post(&url).json(&body);
        if let Some(timeout) = self.send_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %error_text, "Flow runtime error body");
            return Err(ChatError::Transport {
                status: status.as_u16(),
            });
        }

        let raw = response.text().await?;
        let envelope: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, body_len = raw.len(), "Flow runtime returned a non-JSON body");
                return Err(ChatError::MalformedResponse);
            }
        };

        match extract_reply_with_slot(&envelope) {
            Some((slot, reply)) => {
                info!(
                    flow_id = %flow_id,
                    slot = %slot,
                    reply_len = reply.len(),
                    "step: flow runtime run done"
                );
                Ok(reply)
            }
            None => Err(ChatError::MalformedResponse),
        }
    }
}

#[async_trait]
impl ChatTransport for FlowRuntimeClient {
    async fn send_message(
        &self,
        text: &str,
        session_id: &str,
        user_context: Option<&UserContext>,
    ) -> Result<String, ChatError> {
        let result = self.post_run(text, session_id, user_context).await;
        if let Err(e) = &result {
            error!(error = %e, session_id = %session_id, "Flow runtime send failed");
        }
        result
    }
}
