//! **Public API of this crate.** [`TravelChat`] wires the flow id resolver to the chat transport
//! and is the surface the UI (or the CLI) talks to.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use flow_client::{ChatError, ChatTransport, FlowRuntimeClient, UserContext};
use flow_endpoint::{
    BackendFlowIdSource, EndpointError, EndpointFetchError, EndpointResolver, FlowIdSource,
    InitOutcome, ResolverConfig, ResolverPhase, SharedFlowEndpoint,
};
use serde::Serialize;
use tracing::info;

use crate::config::ChatConfig;
use crate::conversation::Conversation;

/// Coarse state of the flow id, for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusIndicator {
    /// Startup discovery has not finished yet.
    Loading,
    /// The last fetch failed; the held id may be stale.
    Error,
    Active,
}

/// Snapshot of the flow id and how it got there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowIdStatus {
    pub flow_id: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub phase: ResolverPhase,
}

impl FlowIdStatus {
    pub fn indicator(&self) -> StatusIndicator {
        if self.last_error.is_some() {
            StatusIndicator::Error
        } else if self.phase < ResolverPhase::SteadyState {
            StatusIndicator::Loading
        } else {
            StatusIndicator::Active
        }
    }
}

/// Chat core: owns the resolver's background task and a transport reading the same endpoint.
pub struct TravelChat {
    resolver: EndpointResolver,
    client: FlowRuntimeClient,
    session_id: String,
}

impl TravelChat {
    /// Builds the chat core from config; no network traffic until [`start`](Self::start).
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::new();
        let source = BackendFlowIdSource::with_client(http.clone(), &config.backend_url)
            .with_timeout(config.fetch_timeout());
        let endpoint = SharedFlowEndpoint::new(config.fallback_flow_id.clone());

        let mut client =
            FlowRuntimeClient::with_client(http, &config.flow_runtime_url, endpoint.clone());
        if let Some(timeout) = config.chat_timeout() {
            client = client.with_send_timeout(timeout);
        }

        Ok(Self::with_parts(
            Arc::new(source),
            client,
            config.resolver_config(),
            &config.session_id,
        ))
    }

    /// Assembles from explicit parts. The resolver writes to `client`'s endpoint.
    pub fn with_parts(
        source: Arc<dyn FlowIdSource>,
        client: FlowRuntimeClient,
        resolver_config: ResolverConfig,
        session_id: &str,
    ) -> Self {
        let resolver = EndpointResolver::new(source, client.endpoint().clone(), resolver_config);
        Self {
            resolver,
            client,
            session_id: session_id.to_string(),
        }
    }

    /// Starts discovery and the periodic refresh in the background. Returns at once.
    pub fn start(&self) -> bool {
        info!(flow_id = %self.resolver.current_id(), "Starting flow id resolver");
        self.resolver.start()
    }

    /// Runs startup discovery to completion, then starts the periodic refresh.
    /// For one-shot commands that want a discovered id before sending.
    pub async fn start_and_wait(&self) -> InitOutcome {
        let outcome = self.resolver.initialize().await;
        self.resolver
            .start_periodic_refresh(self.resolver.config().refresh_interval);
        outcome
    }

    pub async fn stop(&self) {
        self.resolver.stop().await;
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub fn endpoint(&self) -> SharedFlowEndpoint {
        self.resolver.endpoint()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn get_current_endpoint_id(&self) -> String {
        self.resolver.current_id()
    }

    /// Manual, user-triggered refresh. Unlike the timer, failures reach the caller.
    pub async fn refresh_endpoint_id(&self) -> Result<String, EndpointFetchError> {
        self.resolver.refresh().await
    }

    pub fn set_endpoint_id(&self, new_id: &str) -> Result<(), EndpointError> {
        self.resolver.set_manually(new_id)
    }

    /// Sends through the flow runtime using the flow id held right now.
    pub async fn send_message(
        &self,
        text: &str,
        session_id: &str,
        user_context: Option<&UserContext>,
    ) -> Result<String, ChatError> {
        self.client.send_message(text, session_id, user_context).await
    }

    pub async fn check_health(&self) -> bool {
        self.client.check_health().await
    }

    pub fn endpoint_status(&self) -> FlowIdStatus {
        let state = self.resolver.endpoint().snapshot();
        FlowIdStatus {
            flow_id: state.current_id,
            last_updated: state.last_updated,
            last_error: state.last_error,
            phase: self.resolver.phase(),
        }
    }

    /// New conversation on this core's default session.
    pub fn open_conversation(&self, user_context: Option<UserContext>) -> Conversation {
        let conversation = Conversation::new(self.session_id.clone());
        match user_context {
            Some(ctx) => conversation.with_user_context(ctx),
            None => conversation,
        }
    }

    pub fn transport(&self) -> &dyn ChatTransport {
        &self.client
    }
}
