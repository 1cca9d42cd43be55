//! # Flow endpoint resolution
//!
//! Keeps a best-effort current flow id for the flow runtime. The id starts as a compiled-in
//! fallback, is discovered from the configuration backend at startup (bounded retry), and is
//! refreshed periodically in the background; failures never surface to chat callers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flow_endpoint::{BackendFlowIdSource, EndpointResolver, ResolverConfig, SharedFlowEndpoint};
//!
//! async fn example() {
//!     let source = Arc::new(BackendFlowIdSource::new("http://localhost:8000"));
//!     let resolver = EndpointResolver::new(source, SharedFlowEndpoint::default(), ResolverConfig::default());
//!     resolver.start();
//!     println!("flow id: {}", resolver.current_id());
//!     resolver.stop().await;
//! }
//! ```

pub mod error;
pub mod resolver;
pub mod source;
pub mod state;

pub use error::{EndpointError, EndpointFetchError};
pub use resolver::{EndpointResolver, InitOutcome, ResolverConfig, ResolverPhase};
pub use source::{BackendFlowIdSource, FlowIdSource, DEFAULT_FETCH_TIMEOUT, FLOW_ID_PATH};
pub use state::{FetchOutcome, FlowEndpointState, SharedFlowEndpoint, DEFAULT_FALLBACK_FLOW_ID};
