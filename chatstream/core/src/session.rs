//! Session Identity
//!
//! One send creates one session: a single request and the response stream
//! that answers it. Sessions are identified by a [`SessionHandle`]. The
//! controller holds at most one handle as "current"; every transcript
//! mutation a session makes is gated on its handle still being current, so a
//! stopped or superseded session is inert even if its stream keeps
//! delivering.

use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::messages::{ChatRequest, MessageId};

/// Identity and cancellation switch of one in-flight exchange
#[derive(Clone, Debug)]
pub struct SessionHandle {
    /// Per-controller sequence number, strictly increasing
    generation: u64,
    /// Raised by stop, clear, or a newer send
    cancel: CancellationToken,
}

impl SessionHandle {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: CancellationToken::new(),
        }
    }

    /// Sequence number of this session
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Raise the cancellation switch (idempotent)
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the session has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The underlying token, for `select!`
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// A session whose synchronous setup is done but whose stream is not yet read
///
/// Produced by [`ChatController::begin`](crate::ChatController::begin): the
/// user message and the empty assistant placeholder are already in the
/// transcript. Pass it to [`ChatController::run`](crate::ChatController::run)
/// to drive the stream. Dropping it without running leaves the session
/// current until the next send, stop or clear.
#[derive(Debug)]
#[must_use = "a pending session does nothing until it is run"]
pub struct PendingSession {
    pub(crate) handle: SessionHandle,
    pub(crate) request: ChatRequest,
    pub(crate) placeholder: MessageId,
}

impl PendingSession {
    /// Handle of the session
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The request body that will be sent
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// ID of the assistant message this session fills
    pub fn placeholder(&self) -> MessageId {
        self.placeholder
    }
}

/// How a send ended, as reported to its caller
///
/// The controller has already folded the outcome into its published state;
/// this value is informational.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    /// The stream closed cleanly
    Completed {
        /// Concatenation of every token fragment
        content: String,
    },
    /// Stopped, cleared, or superseded by a newer send
    Cancelled,
    /// A transport or protocol failure ended the session
    Failed {
        /// The failure
        error: ChatError,
    },
    /// Nothing was sent (empty or whitespace-only text)
    Rejected,
}

impl SessionOutcome {
    /// Whether the reply arrived in full
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Whether the session ended with a failure
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent_and_shared() {
        let handle = SessionHandle::new(3);
        let clone = handle.clone();
        assert_eq!(handle.generation(), 3);
        assert!(!clone.is_cancelled());

        handle.cancel();
        handle.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.token().is_cancelled());
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(SessionOutcome::Completed {
            content: "x".to_string()
        }
        .is_completed());
        assert!(SessionOutcome::Failed {
            error: ChatError::Status { status: 500 }
        }
        .is_failed());
        assert!(!SessionOutcome::Cancelled.is_completed());
        assert!(!SessionOutcome::Rejected.is_failed());
    }
}
