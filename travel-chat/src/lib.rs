//! # Travel chat
//!
//! Chat core for the travel assistant: discovers the flow id from the configuration backend,
//! keeps it fresh in the background, and relays user messages to the flow runtime.
//! [`TravelChat`] is the consumer-facing surface; [`Conversation`] is the displayed message list.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod core;
pub mod service;

pub use cli::{load_config, run, Cli, Commands, FlowIdAction, IdentityArgs};
pub use config::ChatConfig;
pub use conversation::{
    Conversation, ConversationError, APOLOGY_MESSAGE, MAX_INPUT_CHARS, WELCOME_MESSAGE,
};
pub use crate::core::{init_tracing, ChatMessage};
pub use service::{FlowIdStatus, StatusIndicator, TravelChat};

pub use flow_client::{ChatError, UserContext};
pub use flow_endpoint::{EndpointError, EndpointFetchError, ResolverPhase};
