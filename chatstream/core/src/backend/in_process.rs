//! In-Process Backend
//!
//! Response bodies are fed by the embedding application through channels
//! instead of arriving over a network. Each call to
//! [`InProcessBackend::push_response`] queues one response and returns the
//! [`ResponseFeed`] that writes its body; requests consume queued responses
//! in order.
//!
//! This gives callers exact control over when each chunk arrives, which is
//! what interleaving-sensitive code (and its tests) needs.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::traits::{ByteStream, ChatBackend};
use crate::error::ChatError;
use crate::messages::ChatRequest;

type ChunkResult = Result<Bytes, ChatError>;

/// Writer for one queued response body
///
/// Dropping the feed ends the body cleanly.
#[derive(Debug)]
pub struct ResponseFeed {
    tx: mpsc::UnboundedSender<ChunkResult>,
}

impl ResponseFeed {
    /// Deliver a body chunk
    ///
    /// Returns `false` once the reader has gone away (session finished,
    /// stopped or superseded).
    pub fn chunk(&self, data: impl Into<Bytes>) -> bool {
        self.tx.send(Ok(data.into())).is_ok()
    }

    /// Break off the body with a transport failure
    pub fn fail(&self, error: ChatError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    /// Whether the reader has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A queued reaction to the next request
#[derive(Debug)]
enum Queued {
    /// Accept and stream the body written to the paired feed
    Stream(mpsc::UnboundedReceiver<ChunkResult>),
    /// Refuse the request
    Reject(ChatError),
    /// Never answer
    Stall,
}

/// Backend whose responses are written by the caller
#[derive(Debug, Default)]
pub struct InProcessBackend {
    /// Responses for upcoming requests
    queue: Mutex<VecDeque<Queued>>,
    /// Requests received, in order
    requests: Mutex<Vec<ChatRequest>>,
}

impl InProcessBackend {
    /// Create a backend with nothing queued
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a streamed response and return the feed for its body
    pub fn push_response(&self) -> ResponseFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.queue.lock().push_back(Queued::Stream(rx));
        ResponseFeed { tx }
    }

    /// Queue a refusal (e.g. a non-2xx status)
    pub fn push_rejection(&self, error: ChatError) {
        self.queue.lock().push_back(Queued::Reject(error));
    }

    /// Queue a response whose headers never arrive
    pub fn push_stall(&self) {
        self.queue.lock().push_back(Queued::Stall);
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatBackend for InProcessBackend {
    fn name(&self) -> &'static str {
        "InProcess"
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
        self.requests.lock().push(request.clone());

        let queued = self.queue.lock().pop_front();
        match queued {
            Some(Queued::Stream(rx)) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            Some(Queued::Reject(error)) => Err(error),
            Some(Queued::Stall) => futures::future::pending().await,
            None => Err(ChatError::Transport("No response queued".to_string())),
        }
    }
}
