//! Scripted implementation of [`flow_endpoint::FlowIdSource`] for resolver tests.
//!
//! Answers from a queue of prepared results, then repeats a default answer once the queue is
//! drained. Counts calls so tests can assert on retry and refresh cadence without any network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flow_endpoint::{EndpointFetchError, FlowIdSource};

pub struct ScriptedSource {
    script: Mutex<VecDeque<Option<String>>>,
    /// Answer once the script is drained; `None` means the backend is unavailable.
    default: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Each `Some(id)` is a successful fetch, each `None` a 503 from the backend.
    pub fn new(script: Vec<Option<&str>>, default: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().map(|s| s.map(str::to_string)).collect()),
            default: Mutex::new(default.map(str::to_string)),
            calls: AtomicUsize::new(0),
        })
    }

    /// Backend that never answers successfully.
    pub fn unavailable() -> Arc<Self> {
        Self::new(Vec::new(), None)
    }

    /// Backend that always answers `id`.
    pub fn always(id: &str) -> Arc<Self> {
        Self::new(Vec::new(), Some(id))
    }

    pub fn set_default(&self, default: Option<&str>) {
        *self.default.lock().unwrap() = default.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlowIdSource for ScriptedSource {
    async fn fetch_flow_id(&self) -> Result<String, EndpointFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.lock().unwrap().clone());
        next.ok_or(EndpointFetchError::Status { status: 503 })
    }
}
