//! Errors returned by a chat send.

use thiserror::Error;

/// Why a message produced no reply. Every variant is user-visible as the same apology.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Empty or whitespace-only text; rejected before any network call.
    #[error("message text is empty")]
    Validation,

    /// The flow runtime answered with a non-2xx status.
    #[error("flow runtime returned HTTP {status}")]
    Transport { status: u16 },

    /// 2xx, but no reply text could be extracted from the body.
    #[error("flow runtime response contained no reply text")]
    MalformedResponse,

    /// The request never completed (connect failure, timeout, broken body).
    #[error("flow runtime request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl ChatError {
    /// HTTP status for [`ChatError::Transport`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Transport { status } => Some(*status),
            _ => None,
        }
    }
}
