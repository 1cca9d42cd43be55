//! Endpoint resolver: initial discovery with bounded retry, then an unbounded periodic refresh
//! that runs as a background task until [`EndpointResolver::stop`] (or drop).
//!
//! Phases only move forward: `Uninitialized → Initializing → SteadyState`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{EndpointError, EndpointFetchError};
use crate::source::FlowIdSource;
use crate::state::{FetchOutcome, SharedFlowEndpoint};

/// Retry and refresh policy for the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Discovery attempts at startup before settling on the fallback id.
    pub max_attempts: u32,
    /// Fixed delay between startup attempts.
    pub retry_delay: Duration,
    /// Period of the steady-state refresh.
    pub refresh_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            refresh_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ResolverPhase {
    Uninitialized,
    Initializing,
    SteadyState,
}

/// How startup discovery ended. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Resolved { attempts: u32 },
    Fallback { attempts: u32 },
}

struct ResolverInner {
    source: Arc<dyn FlowIdSource>,
    endpoint: SharedFlowEndpoint,
    config: ResolverConfig,
    phase: watch::Sender<ResolverPhase>,
}

impl ResolverInner {
    fn advance(&self, next: ResolverPhase) {
        self.phase.send_if_modified(|phase| {
            if *phase < next {
                *phase = next;
                true
            } else {
                false
            }
        });
    }

    async fn fetch_once(&self) -> Result<FetchOutcome, EndpointFetchError> {
        match self.source.fetch_flow_id().await {
            Ok(id) => {
                let outcome = self.endpoint.apply_fetched(&id);
                match &outcome {
                    FetchOutcome::Updated { previous, current } => info!(
                        previous = %previous,
                        current = %current,
                        "Flow id updated from backend"
                    ),
                    FetchOutcome::Unchanged => debug!(flow_id = %id, "Flow id is up to date"),
                }
                Ok(outcome)
            }
            Err(e) => {
                self.endpoint.record_error(e.to_string());
                Err(e)
            }
        }
    }

    async fn initialize(&self) -> InitOutcome {
        self.advance(ResolverPhase::Initializing);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match self.fetch_once().await {
                Ok(_) => {
                    info!(
                        attempt,
                        flow_id = %self.endpoint.current_id(),
                        "Flow id initialized"
                    );
                    break InitOutcome::Resolved { attempts: attempt };
                }
                Err(e) if attempt >= max_attempts => {
                    error!(
                        error = %e,
                        attempts = attempt,
                        fallback = %self.endpoint.current_id(),
                        "Flow id initialization failed after all retries, using fallback"
                    );
                    break InitOutcome::Fallback { attempts: attempt };
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        timeout = e.is_timeout(),
                        attempt,
                        max_attempts,
                        "Flow id initialization attempt failed"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        };
        self.advance(ResolverPhase::SteadyState);
        outcome
    }

    async fn run_periodic(&self, period: Duration, cancel: CancellationToken) {
        self.advance(ResolverPhase::SteadyState);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs_f64(), "Started periodic flow id refresh");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.fetch_once().await {
                        debug!(error = %e, "Periodic flow id check failed");
                    }
                }
            }
        }
        info!("Periodic flow id refresh stopped");
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns discovery of the flow id and the lifetime of its refresh task.
///
/// Reads ([`current_id`](Self::current_id)) never block or fail. Background work needs a Tokio runtime.
pub struct EndpointResolver {
    inner: Arc<ResolverInner>,
    running: Mutex<Option<RunningTask>>,
}

impl EndpointResolver {
    pub fn new(
        source: Arc<dyn FlowIdSource>,
        endpoint: SharedFlowEndpoint,
        config: ResolverConfig,
    ) -> Self {
        let (phase, _) = watch::channel(ResolverPhase::Uninitialized);
        Self {
            inner: Arc::new(ResolverInner {
                source,
                endpoint,
                config,
                phase,
            }),
            running: Mutex::new(None),
        }
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningTask>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle to the state this resolver writes; hand it to readers such as the chat transport.
    pub fn endpoint(&self) -> SharedFlowEndpoint {
        self.inner.endpoint.clone()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.inner.config
    }

    pub fn current_id(&self) -> String {
        self.inner.endpoint.current_id()
    }

    /// Manual override from the host. Only empty ids are rejected.
    pub fn set_manually(&self, id: &str) -> Result<(), EndpointError> {
        self.inner.endpoint.set_manually(id)?;
        info!(flow_id = %id.trim(), "Flow id updated manually");
        Ok(())
    }

    pub fn phase(&self) -> ResolverPhase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ResolverPhase> {
        self.inner.phase.subscribe()
    }

    /// One discovery request. Errors are returned for the caller's retry policy.
    pub async fn fetch_once(&self) -> Result<FetchOutcome, EndpointFetchError> {
        self.inner.fetch_once().await
    }

    /// Startup discovery: up to `max_attempts` fetches `retry_delay` apart. Exhaustion keeps the fallback id.
    pub async fn initialize(&self) -> InitOutcome {
        self.inner.initialize().await
    }

    /// User-triggered refresh; unlike the periodic loop, failures are returned.
    pub async fn refresh(&self) -> Result<String, EndpointFetchError> {
        match self.inner.fetch_once().await {
            Ok(_) => Ok(self.current_id()),
            Err(e) => {
                warn!(error = %e, "Manual flow id refresh failed");
                Err(e)
            }
        }
    }

    /// Spawns the full lifecycle: [`initialize`](Self::initialize), then periodic refresh at
    /// `refresh_interval`. Returns false when a task is already running.
    pub fn start(&self) -> bool {
        let inner = self.inner.clone();
        let period = self.inner.config.refresh_interval;
        self.spawn_task(move |cancel| async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = inner.initialize() => {}
            }
            inner.run_periodic(period, cancel).await;
        })
    }

    /// Spawns only the refresh loop, for hosts that ran [`initialize`](Self::initialize) themselves.
    /// Returns false when a task is already running.
    pub fn start_periodic_refresh(&self, interval: Duration) -> bool {
        let inner = self.inner.clone();
        self.spawn_task(move |cancel| async move { inner.run_periodic(interval, cancel).await })
    }

    fn spawn_task<F, Fut>(&self, make_task: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut running = self.lock_running();
        if running.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            warn!("Flow id resolver already running");
            return false;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(make_task(cancel.clone()));
        *running = Some(RunningTask { cancel, handle });
        true
    }

    pub fn is_running(&self) -> bool {
        self.lock_running()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Cancels the background task and waits for it to finish. No-op when nothing is running.
    pub async fn stop(&self) {
        let task = self.lock_running().take();
        if let Some(RunningTask { cancel, handle }) = task {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "Flow id resolver task ended abnormally");
            }
        }
    }
}

impl Drop for EndpointResolver {
    fn drop(&mut self) {
        if let Some(task) = self.lock_running().take() {
            task.cancel.cancel();
        }
    }
}
