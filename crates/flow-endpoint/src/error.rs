//! Error types for flow id discovery.

use thiserror::Error;

/// Failure to learn the flow id from the configuration backend.
///
/// Never reaches the chat path: the resolver retries it during initialization and
/// absorbs it during periodic refresh. Only a manual refresh hands it back to the caller.
#[derive(Error, Debug)]
pub enum EndpointFetchError {
    #[error("flow id request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("flow id backend returned HTTP {status}")]
    Status { status: u16 },

    #[error("flow id backend response carried no flow_id")]
    MissingFlowId,
}

impl EndpointFetchError {
    /// True when the request hit the fetch timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EndpointFetchError::Request(e) if e.is_timeout())
    }
}

/// Rejected manual update of the endpoint state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EndpointError {
    #[error("flow id must not be empty")]
    EmptyFlowId,
}
