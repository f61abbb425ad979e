//! Chat Backends
//!
//! This module provides the sources a session can stream a reply from,
//! behind the common [`ChatBackend`] trait.
//!
//! # Available Backends
//!
//! - **HTTP**: remote endpoint speaking JSON in, event stream out (default)
//! - **Replay**: a recorded body re-served in small chunks
//! - **InProcess**: bodies written chunk by chunk by the embedding code
//!
//! # Usage
//!
//! ```ignore
//! use chatstream_core::backend::{ChatBackend, HttpBackend};
//! use chatstream_core::{ChatRequest, ClientConfig};
//!
//! let backend = HttpBackend::new(&ClientConfig::local()?)?;
//! let body = backend.open_stream(&ChatRequest::default()).await?;
//! ```

mod http;
mod in_process;
mod replay;
mod traits;

pub use http::HttpBackend;
pub use in_process::{InProcessBackend, ResponseFeed};
pub use replay::ReplayBackend;
pub use traits::{ByteStream, ChatBackend};
