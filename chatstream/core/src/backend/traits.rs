//! Chat Backend Traits
//!
//! The transport seam between the session controller and whatever delivers
//! response bodies. The controller never sees HTTP: it hands a
//! [`ChatRequest`] to a backend and reads raw chunks from the returned
//! [`ByteStream`] until the stream ends, fails, or the session is cancelled.
//!
//! Cancellation is by drop. When a session is stopped or superseded the
//! controller drops the stream, and the backend must stop delivering (for
//! HTTP this aborts the body transfer).

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::ChatError;
use crate::messages::ChatRequest;

/// Raw body chunks of one response, in arrival order
pub type ByteStream = BoxStream<'static, Result<Bytes, ChatError>>;

/// Chat backend trait
///
/// Implement this trait to stream replies from a different source.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Get the backend name (e.g., "HTTP", "Replay")
    fn name(&self) -> &str;

    /// Issue a request and return its response body as a chunk stream
    ///
    /// Resolves once the response has been accepted (for HTTP: headers with
    /// a success status). Failures before that point are returned here;
    /// failures during the body transfer arrive as stream items.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ChatError>;
}
