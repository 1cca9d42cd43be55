//! Flow endpoint state: the current flow id plus bookkeeping, behind a cloneable shared handle.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EndpointError;

/// Flow id used until the backend confirms another one.
pub const DEFAULT_FALLBACK_FLOW_ID: &str = "032a160c-7ac3-41db-b3ee-cfcf15ccdc8c";

/// Snapshot of the endpoint state. `current_id` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEndpointState {
    pub current_id: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Result of applying a flow id fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The backend returned a different id; state now holds `current`.
    Updated { previous: String, current: String },
    /// The backend returned the id already held; nothing changed.
    Unchanged,
}

/// Shared, cloneable handle to the single [`FlowEndpointState`].
///
/// The resolver is the only automatic writer; the transport and diagnostics read
/// consistent snapshots without blocking on I/O.
#[derive(Debug, Clone)]
pub struct SharedFlowEndpoint {
    inner: Arc<RwLock<FlowEndpointState>>,
}

impl SharedFlowEndpoint {
    /// Creates the state holding `fallback_id`. An empty fallback falls back to [`DEFAULT_FALLBACK_FLOW_ID`].
    pub fn new(fallback_id: impl Into<String>) -> Self {
        let fallback_id = fallback_id.into();
        let current_id = match fallback_id.trim() {
            "" => DEFAULT_FALLBACK_FLOW_ID.to_string(),
            id => id.to_string(),
        };
        Self {
            inner: Arc::new(RwLock::new(FlowEndpointState {
                current_id,
                last_updated: None,
                last_error: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FlowEndpointState> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FlowEndpointState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current flow id. Never blocks on I/O and never fails.
    pub fn current_id(&self) -> String {
        self.read().current_id.clone()
    }

    pub fn snapshot(&self) -> FlowEndpointState {
        self.read().clone()
    }

    /// Applies an id confirmed by the backend. Empty ids are ignored.
    ///
    /// A differing id replaces the current one and stamps `last_updated`; the same id
    /// leaves `current_id` and `last_updated` as they were. Either way `last_error` is cleared.
    pub fn apply_fetched(&self, fetched_id: &str) -> FetchOutcome {
        let fetched_id = fetched_id.trim();
        let mut state = self.write();
        state.last_error = None;
        if fetched_id.is_empty() || fetched_id == state.current_id {
            return FetchOutcome::Unchanged;
        }
        let previous = std::mem::replace(&mut state.current_id, fetched_id.to_string());
        state.last_updated = Some(Utc::now());
        FetchOutcome::Updated {
            previous,
            current: fetched_id.to_string(),
        }
    }

    /// Overrides the id immediately. Only an empty id is rejected.
    pub fn set_manually(&self, id: &str) -> Result<(), EndpointError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(EndpointError::EmptyFlowId);
        }
        let mut state = self.write();
        state.current_id = id.to_string();
        state.last_updated = Some(Utc::now());
        state.last_error = None;
        Ok(())
    }

    pub fn record_error(&self, error: impl Into<String>) {
        self.write().last_error = Some(error.into());
    }
}

impl Default for SharedFlowEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_FLOW_ID)
    }
}
