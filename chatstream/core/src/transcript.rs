//! Transcript Store
//!
//! Ordered log of conversation messages. Insertion order is conversation
//! order. The store never reorders entries and only ever removes one: the
//! tail, when a failed exchange rolls back its assistant placeholder.
//!
//! Only the tail is mutable, and only through [`Transcript::replace_tail`],
//! which sets the full content rather than appending to it. Re-applying the
//! same accumulated text is therefore harmless.

use thiserror::Error;

use crate::messages::{Message, MessageId, WireMessage};

/// Errors from tail operations on an empty transcript
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    /// The operation needs at least one message
    #[error("Transcript is empty")]
    Empty,
}

/// The conversation transcript
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message at the end
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the content of the last message
    pub fn replace_tail(
        &mut self,
        content: impl Into<String>,
    ) -> Result<&Message, TranscriptError> {
        let tail = self.messages.last_mut().ok_or(TranscriptError::Empty)?;
        tail.content = content.into();
        Ok(tail)
    }

    /// Remove and return the last message
    pub fn drop_last(&mut self) -> Result<Message, TranscriptError> {
        self.messages.pop().ok_or(TranscriptError::Empty)
    }

    /// Clear all messages
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// All messages in order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last message
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get message by ID
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript has no messages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Role/content pairs for an outbound request
    #[must_use]
    pub fn to_wire(&self) -> Vec<WireMessage> {
        self.messages.iter().map(Message::to_wire).collect()
    }
}
