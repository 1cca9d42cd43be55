//! Chat message type shown in the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in the displayed conversation, either typed by the user or produced by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    /// Raw text, rendered as markdown by the host.
    pub content: String,
    pub is_from_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(content: impl Into<String>, is_from_user: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            is_from_user,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_author() {
        assert!(ChatMessage::user("hi").is_from_user);
        assert!(!ChatMessage::assistant("hello").is_from_user);
    }

    #[test]
    fn test_ids_are_unique_uuids() {
        let a = ChatMessage::user("a");
        let b = ChatMessage::user("a");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(ChatMessage::assistant("x")).unwrap();
        assert_eq!(json["isFromUser"], false);
        assert_eq!(json["content"], "x");
    }
}
