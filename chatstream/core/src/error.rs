//! Error Types
//!
//! Failures a streaming exchange can end with. Every variant is caught at the
//! session boundary by the [`ChatController`](crate::ChatController) and
//! folded into the user-visible `error` field; none of them escape into the
//! display layer's control flow.
//!
//! Cancellation (an explicit stop, or supersession by a newer send) is
//! deliberately absent here: it is an outcome, not a failure.

use thiserror::Error;

use crate::transcript::TranscriptError;

/// Broad class of a failure, used for logging and rollback decisions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Network failure or non-2xx response
    Transport,
    /// The stream delivered something that could not be decoded
    Protocol,
}

/// Errors raised while opening or consuming a streamed response
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ChatError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The request could not be sent or the body transfer broke off
    #[error("{0}")]
    Transport(String),

    /// An event payload was present but not valid structured content
    #[error("Invalid stream payload ({reason}): {payload}")]
    Protocol {
        /// The raw payload text
        payload: String,
        /// Why decoding failed
        reason: String,
    },

    /// The transcript rejected a mutation
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl ChatError {
    /// Create a protocol error for a payload
    pub fn protocol(payload: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            payload: payload.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Status { .. } | Self::Transport(_) => FailureKind::Transport,
            Self::Protocol { .. } | Self::Transcript(_) => FailureKind::Protocol,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if !status.is_success() => Self::Status {
                status: status.as_u16(),
            },
            _ => Self::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_matches_http_prefix() {
        let err = ChatError::Status { status: 503 };
        assert_eq!(err.to_string(), "HTTP 503");
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[test]
    fn test_protocol_error_kind() {
        let err = ChatError::protocol("{oops", "expected value");
        assert_eq!(err.kind(), FailureKind::Protocol);
        assert!(err.to_string().contains("{oops"));
    }

    #[test]
    fn test_transcript_error_converts() {
        let err: ChatError = TranscriptError::Empty.into();
        assert_eq!(err.kind(), FailureKind::Protocol);
    }
}
