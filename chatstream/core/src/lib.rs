//! Chatstream Core - Headless Streaming Chat Client
//!
//! This crate consumes a conversational endpoint that streams its reply as
//! server-sent events, completely independent of any UI. A terminal, a web
//! view or a test harness drives it through three commands (send, stop,
//! clear) and renders the snapshots it publishes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Surfaces                                │
//! │        send / stop / clear  ▼          ▲  ChatSnapshot (watch)    │
//! └─────────────────────────────┼──────────┼─────────────────────────┘
//!                               │          │
//! ┌─────────────────────────────┼──────────┼─────────────────────────┐
//! │                      CHATSTREAM CORE                             │
//! │  ┌──────────────────────────┴──────────┴──────────────────────┐  │
//! │  │                     ChatController                         │  │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌─────────────────────┐ │  │
//! │  │  │ Transcript │  │ SessionHandle│  │ FrameDecoder ──►    │ │  │
//! │  │  │   Store    │  │ (generation) │  │ interpret()         │ │  │
//! │  │  └────────────┘  └──────────────┘  └──────────▲──────────┘ │  │
//! │  └───────────────────────────────────────────────┼────────────┘  │
//! │                                     ChatBackend  │ byte chunks   │
//! │                         (HTTP / Replay / InProcess)              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatController`]: owns the transcript and the in-flight session
//! - [`ChatSnapshot`]: the read model surfaces render
//! - [`FrameDecoder`]: reassembles events from arbitrarily split chunks
//! - [`ChatBackend`]: where response bodies come from
//!
//! # Quick Start
//!
//! ```ignore
//! use chatstream_core::{ChatController, ClientConfig, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = HttpBackend::new(&ClientConfig::local()?)?;
//!     let controller = ChatController::new(backend);
//!
//!     let mut updates = controller.subscribe();
//!     tokio::spawn(async move {
//!         while updates.changed().await.is_ok() {
//!             let snapshot = updates.borrow_and_update().clone();
//!             // render snapshot
//!         }
//!     });
//!
//!     controller.send_message("Hi").await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`sse`]: frame decoding and event interpretation
//! - [`transcript`]: the ordered message log
//! - [`controller`]: the session state machine
//! - [`backend`]: transport seam and its implementations
//! - [`config`]: endpoint and logging configuration
//! - [`error`]: failure taxonomy
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on terminal or UI frameworks.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod session;
pub mod sse;
pub mod transcript;

// Re-exports for convenience
pub use backend::{
    ByteStream, ChatBackend, HttpBackend, InProcessBackend, ReplayBackend, ResponseFeed,
};
pub use config::{
    default_config_path, load_config, load_config_file, resolve_config, ClientConfig,
    ConfigError, ConfigFile, ConfigOverrides, ConfigSource, ResolvedConfig, DEFAULT_ENDPOINT,
};
pub use controller::ChatController;
pub use error::{ChatError, FailureKind};
pub use messages::{
    ChatRequest, ChatSnapshot, Message, MessageId, MessageRole, SessionPhase, WireMessage,
};
pub use session::{PendingSession, SessionHandle, SessionOutcome};
pub use sse::{event_records, interpret, EventRecord, Frame, FrameDecoder, StreamEvent};
pub use transcript::{Transcript, TranscriptError};
