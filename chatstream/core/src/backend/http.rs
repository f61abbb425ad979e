//! HTTP Backend Implementation
//!
//! Streams replies from a remote chat endpoint.
//!
//! # Endpoint Contract
//!
//! - `POST <endpoint>` with JSON body `{"messages": [{"role", "content"}, ...]}`
//! - Success responses carry a `text/event-stream` body
//! - Any non-2xx status fails the exchange with `HTTP <status>`
//!
//! No request timeout is configured: a reply may legitimately stream for as
//! long as the endpoint keeps sending. Sessions end by closure or by stop.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Url;
use tracing::debug;

use super::traits::{ByteStream, ChatBackend};
use crate::config::ClientConfig;
use crate::error::ChatError;
use crate::messages::ChatRequest;

/// Media type requested from the endpoint
const EVENT_STREAM: &str = "text/event-stream";

/// HTTP chat backend
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Target endpoint
    endpoint: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for a validated client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ChatError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("chatstream/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http_client,
        })
    }

    /// The endpoint requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ChatError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(ACCEPT, EVENT_STREAM)
            .json(request)
            .send()
            .await?;

        // Check for HTTP errors
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
            });
        }

        debug!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            messages = request.messages.len(),
            "Response stream opened"
        );

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatError::from))
            .boxed())
    }
}
