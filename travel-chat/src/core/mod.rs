//! Core types and logger.

pub mod logger;
pub mod types;

pub use logger::init_tracing;
pub use types::ChatMessage;
