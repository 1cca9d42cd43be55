//! Application config loaded from env.

mod chat_config;


pub use chat_config::{
    ChatConfig, DEFAULT_BACKEND_URL, DEFAULT_CHAT_SESSION_ID, DEFAULT_FLOW_RUNTIME_URL,
};
