//! Server-Sent Event Decoding
//!
//! Two stages sit between the raw response body and the transcript:
//!
//! ```text
//! bytes ──► FrameDecoder ──► EventRecord ──► interpret() ──► StreamEvent
//!           (framing)        (data: line)    (payload)       (token / done / ...)
//! ```
//!
//! [`event_records`] wires the first stage onto any chunk stream; the
//! controller feeds each record through [`interpret`].

mod event;
mod frame;

pub use event::{interpret, StreamEvent, DONE_SENTINEL};
pub use frame::{event_records, EventRecord, Frame, FrameDecoder};
