//! Conversation Messages
//!
//! The data model shared by the transcript, the controller, and whatever
//! surface renders the conversation:
//!
//! - [`Message`]: one turn in the transcript
//! - [`ChatRequest`] / [`WireMessage`]: the outbound request body
//! - [`ChatSnapshot`]: the read model published to observers
//!
//! Surfaces are pure renderers. They read snapshots and call `send`, `stop`
//! and `clear`; they never mutate messages themselves.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg_{}", self.0.simple())
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Streamed reply from the endpoint
    Assistant,
}

impl MessageRole {
    /// Label used by surfaces when rendering a turn
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
}

impl Message {
    /// Create a user message; its content never changes afterwards
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an empty assistant message to be filled by a stream
    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::Assistant,
            content: String::new(),
        }
    }

    /// Role and content only, as sent to the endpoint
    #[must_use]
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A message as it appears in the request body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// `"user"` or `"assistant"`
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

/// Request body for one exchange: the full conversation so far
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prior transcript plus the new user message, in order
    pub messages: Vec<WireMessage>,
}

impl ChatRequest {
    /// Create a request from wire messages
    #[must_use]
    pub fn new(messages: Vec<WireMessage>) -> Self {
        Self { messages }
    }
}

/// Controller lifecycle phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No exchange in flight
    #[default]
    Idle,
    /// Request issued, waiting for response headers
    Sending,
    /// Reading the response body
    Streaming,
}

impl SessionPhase {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Sending => "Sending...",
            Self::Streaming => "Responding...",
        }
    }
}

/// Consistent view of the conversation at one point in time
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    /// Transcript in conversation order
    pub messages: Vec<Message>,
    /// Whether an exchange is in flight
    pub is_streaming: bool,
    /// Last failure, if the most recent exchange failed
    pub error: Option<String>,
    /// Current lifecycle phase
    pub phase: SessionPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("msg_"));
    }

    #[test]
    fn test_request_serializes_roles_lowercase() {
        let request = ChatRequest::new(vec![
            Message::user("Hi").to_wire(),
            WireMessage {
                role: MessageRole::Assistant,
                content: "Hello".to_string(),
            },
        ]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"},
                ]
            })
        );
    }

    #[test]
    fn test_wire_message_drops_id() {
        let msg = Message::user("question");
        let json = serde_json::to_value(msg.to_wire()).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_phase_description() {
        assert_eq!(SessionPhase::Idle.description(), "Ready");
        assert_eq!(SessionPhase::Streaming.description(), "Responding...");
    }
}
