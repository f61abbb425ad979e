//! Stream Session Controller
//!
//! Owns the transcript and at most one in-flight exchange. Surfaces call
//! [`ChatController::send_message`], [`ChatController::stop`] and
//! [`ChatController::clear`], and read state through snapshots; they never
//! touch the transcript directly.
//!
//! # Lifecycle
//!
//! ```text
//!   send ──► Sending ──open──► Streaming ──close──► Idle
//!               │                  │
//!               ├── error ─────────┴──► Idle (error set, placeholder rolled back)
//!               └── stop / clear / newer send ──► Idle (partial reply kept)
//! ```
//!
//! # Supersession
//!
//! Every session carries a [`SessionHandle`]. The controller keeps one
//! handle as current, and every mutation a session makes is applied under
//! the state lock only after checking that its handle is still current. A
//! stop, a clear, or a newer send replaces the current handle and raises the
//! old one's cancellation token in the same critical section, so a session
//! that lost its handle can never write again, even if its stream races
//! ahead of the token.
//!
//! The state lock is a `parking_lot::Mutex` and is never held across an
//! `.await`.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::error::ChatError;
use crate::messages::{ChatRequest, ChatSnapshot, Message, MessageId, SessionPhase};
use crate::session::{PendingSession, SessionHandle, SessionOutcome};
use crate::sse::{event_records, interpret, StreamEvent};
use crate::transcript::Transcript;

/// Mutable controller state, guarded by one lock
#[derive(Debug, Default)]
struct ControllerState {
    transcript: Transcript,
    current: Option<SessionHandle>,
    last_generation: u64,
    phase: SessionPhase,
    error: Option<String>,
}

impl ControllerState {
    fn is_current(&self, handle: &SessionHandle) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.generation() == handle.generation())
    }

    /// Cancel and forget the current session, if any
    fn supersede(&mut self) -> Option<u64> {
        let previous = self.current.take()?;
        previous.cancel();
        Some(previous.generation())
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.transcript.messages().to_vec(),
            is_streaming: self.phase != SessionPhase::Idle,
            error: self.error.clone(),
            phase: self.phase,
        }
    }
}

/// The session controller
///
/// Cloning is cheap and every clone drives the same conversation, so one
/// clone can `stop` while another is awaiting `send_message`.
pub struct ChatController<B> {
    backend: Arc<B>,
    state: Arc<Mutex<ControllerState>>,
    updates: Arc<watch::Sender<ChatSnapshot>>,
}

impl<B> Clone for ChatController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
            updates: Arc::clone(&self.updates),
        }
    }
}

impl<B> std::fmt::Debug for ChatController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ChatController")
            .field("messages", &state.transcript.len())
            .field("phase", &state.phase)
            .field("generation", &state.last_generation)
            .finish_non_exhaustive()
    }
}

impl<B: ChatBackend> ChatController<B> {
    /// Create a controller with an empty transcript
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Create a controller over a shared backend
    pub fn with_backend(backend: Arc<B>) -> Self {
        let (updates, _) = watch::channel(ChatSnapshot::default());
        Self {
            backend,
            state: Arc::new(Mutex::new(ControllerState::default())),
            updates: Arc::new(updates),
        }
    }

    /// The backend sessions stream from
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.updates.borrow().clone()
    }

    /// Receive a notification after every state change
    ///
    /// Slow observers see the latest snapshot, not every intermediate one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.updates.subscribe()
    }

    /// Whether an exchange is in flight
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.state.lock().phase != SessionPhase::Idle
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// Failure of the most recent exchange, if it failed
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Transcript in conversation order
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().transcript.messages().to_vec()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a message and stream the reply to completion
    ///
    /// Returns once the session has ended for any reason. The outcome is
    /// already reflected in the published state when this returns.
    pub async fn send_message(&self, text: &str) -> SessionOutcome {
        match self.begin(text) {
            Some(pending) => self.run(pending).await,
            None => SessionOutcome::Rejected,
        }
    }

    /// Start a session and drive it on a background task
    ///
    /// The transcript has grown by two messages when this returns. Returns
    /// `None` if the text was rejected.
    pub fn spawn_send(&self, text: &str) -> Option<JoinHandle<SessionOutcome>>
    where
        B: 'static,
    {
        let pending = self.begin(text)?;
        let controller = self.clone();
        Some(tokio::spawn(async move { controller.run(pending).await }))
    }

    /// Synchronous half of a send
    ///
    /// Rejects empty or whitespace-only text. Otherwise supersedes any
    /// active session, appends the user message and an empty assistant
    /// placeholder, clears the error, and publishes.
    pub fn begin(&self, text: &str) -> Option<PendingSession> {
        if text.trim().is_empty() {
            debug!("Ignoring empty message");
            return None;
        }

        let mut state = self.state.lock();
        if let Some(previous) = state.supersede() {
            debug!(generation = previous, "Superseded by a newer send");
        }

        state.last_generation += 1;
        let handle = SessionHandle::new(state.last_generation);

        state.transcript.append(Message::user(text));
        let request = ChatRequest::new(state.transcript.to_wire());

        let placeholder = Message::assistant_placeholder();
        let placeholder_id = placeholder.id;
        state.transcript.append(placeholder);

        state.error = None;
        state.phase = SessionPhase::Sending;
        state.current = Some(handle.clone());
        self.updates.send_replace(state.snapshot());

        Some(PendingSession {
            handle,
            request,
            placeholder: placeholder_id,
        })
    }

    /// Asynchronous half of a send: open the stream and fold it in
    pub async fn run(&self, pending: PendingSession) -> SessionOutcome {
        let PendingSession {
            handle,
            request,
            placeholder,
        } = pending;
        let generation = handle.generation();

        info!(
            generation,
            backend = self.backend.name(),
            messages = request.messages.len(),
            "Session started"
        );

        let opened = tokio::select! {
            biased;
            () = handle.token().cancelled() => return Self::cancelled(generation),
            opened = self.backend.open_stream(&request) => opened,
        };

        let body = match opened {
            Ok(body) => body,
            Err(error) => return self.fail(&handle, placeholder, error),
        };

        if self
            .with_current(&handle, |state| state.phase = SessionPhase::Streaming)
            .is_none()
        {
            return Self::cancelled(generation);
        }

        let mut records = Box::pin(event_records(body));
        let mut content = String::new();

        loop {
            let next = tokio::select! {
                biased;
                () = handle.token().cancelled() => return Self::cancelled(generation),
                next = records.next() => next,
            };

            let record = match next {
                Some(Ok(record)) => record,
                Some(Err(error)) => return self.fail(&handle, placeholder, error),
                None => break,
            };

            match interpret(&record.payload) {
                Ok(StreamEvent::Token(fragment)) => {
                    content.push_str(&fragment);
                    let applied = self.with_current(&handle, |state| {
                        state.transcript.replace_tail(content.as_str()).map(|_| ())
                    });
                    match applied {
                        Some(Ok(())) => {}
                        Some(Err(error)) => return self.fail(&handle, placeholder, error.into()),
                        None => return Self::cancelled(generation),
                    }
                }
                Ok(StreamEvent::Done) => debug!(generation, "End-of-stream marker"),
                Ok(StreamEvent::ToolCall { name, args }) => {
                    debug!(generation, tool = %name, args = %args, "Tool call ignored");
                }
                Ok(StreamEvent::Ignored { kind }) => {
                    debug!(generation, kind = ?kind, "Discarded record");
                }
                Err(error) => return self.fail(&handle, placeholder, error),
            }
        }

        let finished = self.with_current(&handle, |state| {
            state.phase = SessionPhase::Idle;
            state.current = None;
        });
        if finished.is_none() {
            return Self::cancelled(generation);
        }

        info!(generation, chars = content.chars().count(), "Session completed");
        SessionOutcome::Completed { content }
    }

    /// Stop the active session, keeping whatever has streamed so far
    ///
    /// Does nothing when idle.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let Some(generation) = state.supersede() else {
            return;
        };
        state.phase = SessionPhase::Idle;
        self.updates.send_replace(state.snapshot());
        info!(generation, "Session stopped");
    }

    /// Stop any active session and empty the transcript
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if let Some(generation) = state.supersede() {
            debug!(generation, "Superseded by clear");
        }
        state.transcript.reset();
        state.error = None;
        state.phase = SessionPhase::Idle;
        self.updates.send_replace(state.snapshot());
        info!("Transcript cleared");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply `mutate` and publish, only if `handle` is still current
    fn with_current<R>(
        &self,
        handle: &SessionHandle,
        mutate: impl FnOnce(&mut ControllerState) -> R,
    ) -> Option<R> {
        let mut state = self.state.lock();
        if !state.is_current(handle) {
            return None;
        }
        let result = mutate(&mut state);
        self.updates.send_replace(state.snapshot());
        Some(result)
    }

    /// Record a failure and roll back the reply
    fn fail(
        &self,
        handle: &SessionHandle,
        placeholder: MessageId,
        error: ChatError,
    ) -> SessionOutcome {
        let generation = handle.generation();
        let recorded = self.with_current(handle, |state| {
            if state.transcript.last().is_some_and(|m| m.id == placeholder) {
                if let Ok(dropped) = state.transcript.drop_last() {
                    debug!(generation, chars = dropped.content.len(), "Rolled back reply");
                }
            }
            state.error = Some(error.to_string());
            state.phase = SessionPhase::Idle;
            state.current = None;
        });

        if recorded.is_none() {
            return Self::cancelled(generation);
        }

        warn!(generation, kind = ?error.kind(), error = %error, "Session failed");
        SessionOutcome::Failed { error }
    }

    fn cancelled(generation: u64) -> SessionOutcome {
        debug!(generation, "Session cancelled");
        SessionOutcome::Cancelled
    }
}
