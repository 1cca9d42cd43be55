//! Displayed conversation: input policy, message ordering, and the apology on failure.
//!
//! The user's message is appended before the send starts; the assistant's reply (or the
//! fixed apology when the send fails for any reason) is appended after it completes.

use flow_client::{ChatTransport, UserContext};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::ChatMessage;

/// Longest input the chat box accepts, in characters.
pub const MAX_INPUT_CHARS: usize = 300;

/// Greeting shown when the chat opens.
pub const WELCOME_MESSAGE: &str = "👋 **Xin chào!** Tôi là TravelMate AI.\n\nHãy hỏi tôi về du lịch Việt Nam!\n\n**Ví dụ:**\n- Điểm du lịch Hà Nội\n- Món ăn miền Trung\n- Lịch trình Sapa";

/// Shown in place of a reply for every send failure.
pub const APOLOGY_MESSAGE: &str =
    "😅 **Xin lỗi!** Tôi đang gặp vấn đề kỹ thuật.\n\nVui lòng thử lại sau! 🔄";

/// Input rejected before anything is appended or sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("Message is {len} characters; the limit is {max}")]
    InputTooLong { len: usize, max: usize },
}

/// One chat session as the user sees it.
#[derive(Debug, Clone)]
pub struct Conversation {
    session_id: String,
    user_context: Option<UserContext>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Opens a conversation seeded with the welcome message.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_context: None,
            messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
        }
    }

    pub fn with_user_context(mut self, user_context: UserContext) -> Self {
        self.user_context = Some(user_context);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_context(&self) -> Option<&UserContext> {
        self.user_context.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Checks the input box content. Blank input is not sendable.
    pub fn validate_input(input: &str) -> Result<(), ConversationError> {
        if input.trim().is_empty() {
            return Err(ConversationError::EmptyInput);
        }
        let len = input.chars().count();
        if len > MAX_INPUT_CHARS {
            return Err(ConversationError::InputTooLong {
                len,
                max: MAX_INPUT_CHARS,
            });
        }
        Ok(())
    }

    /// Sends `input` through `transport` and returns the appended assistant message.
    ///
    /// Transport failures never surface here: they become [`APOLOGY_MESSAGE`].
    pub async fn send(
        &mut self,
        transport: &dyn ChatTransport,
        input: &str,
    ) -> Result<&ChatMessage, ConversationError> {
        Self::validate_input(input)?;

        self.messages.push(ChatMessage::user(input));

        let reply = match transport
            .send_message(input, &self.session_id, self.user_context.as_ref())
            .await
        {
            Ok(reply) => {
                info!(session_id = %self.session_id, reply_len = reply.len(), "Assistant replied");
                reply
            }
            Err(e) => {
                warn!(error = %e, session_id = %self.session_id, "Showing apology instead of reply");
                APOLOGY_MESSAGE.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(reply));
        let last = self.messages.len() - 1;
        Ok(&self.messages[last])
    }
}
