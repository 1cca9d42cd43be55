//! # Flow runtime chat client
//!
//! Delivers one user utterance to the flow runtime and returns one plain-text reply:
//!
//! 1. Rejects blank text ([`ChatError::Validation`]) before touching the network.
//! 2. Prefixes an identity preamble when the [`UserContext`] is authenticated.
//! 3. POSTs `{input_value, session_id, user_context}` to `/api/v1/run/{flow_id}`, reading the
//!    flow id from a [`flow_endpoint::SharedFlowEndpoint`] at send time.
//! 4. Pulls the reply out of the response envelope with the ordered [`REPLY_SLOTS`] chain.
//!
//! Concurrent sends are independent; no ordering is implied between their replies.

pub mod client;
pub mod context;
pub mod error;
pub mod extract;

pub use client::{ChatTransport, FlowRuntimeClient, OutboundRequest};
pub use context::{annotate_message, UserContext, PREAMBLE_LABEL};
pub use error::ChatError;
pub use extract::{extract_reply, extract_reply_with_slot, first_run_output, ReplySlot, REPLY_SLOTS};
