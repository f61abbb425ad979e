//! Replay Backend
//!
//! Serves a recorded response body, cut into fixed-size chunks, for every
//! request. Small chunk sizes deliberately split frames, delimiters and
//! multibyte characters, which makes this backend useful both for offline
//! demos and for exercising reassembly.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;

use super::traits::{ByteStream, ChatBackend};
use crate::error::ChatError;
use crate::messages::ChatRequest;

/// Backend replaying a recorded event-stream body
#[derive(Debug)]
pub struct ReplayBackend {
    /// Recorded response body
    body: Bytes,
    /// Bytes per delivered chunk (at least 1)
    chunk_size: usize,
    /// Requests received, in order
    requests: Mutex<Vec<ChatRequest>>,
}

impl ReplayBackend {
    /// Create a replay of `body` delivered in `chunk_size` byte pieces
    pub fn new(body: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            body: body.into(),
            chunk_size: chunk_size.max(1),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The chunks one replay delivers
    #[must_use]
    pub fn chunks(&self) -> Vec<Bytes> {
        (0..self.body.len())
            .step_by(self.chunk_size)
            .map(|start| {
                let end = (start + self.chunk_size).min(self.body.len());
                self.body.slice(start..end)
            })
            .collect()
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "Replay"
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
        self.requests.lock().push(request.clone());
        Ok(stream::iter(self.chunks().into_iter().map(Ok)).boxed())
    }
}
