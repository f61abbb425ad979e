//! Event-Stream Frame Decoder
//!
//! Reassembles a chunked response body into complete event-stream frames.
//!
//! # Frame Format
//!
//! ```text
//! data: {"type":"token","content":"Hel"}\n
//! \n                                        <- blank line ends the frame
//! data: [DONE]\n
//! \n
//! ```
//!
//! Chunks may split the body at any byte offset: inside a payload, between
//! the two line terminators of a boundary, or in the middle of a multibyte
//! character. The decoder buffers across chunks and only yields a frame once
//! its closing blank line has arrived.
//!
//! Text decoding is incremental. Bytes of a character cut off at the end of
//! a chunk are held until the next chunk completes them; invalid sequences
//! decode to U+FFFD. CRLF line endings are normalized to LF.

use futures::{future, stream, Stream, StreamExt};

/// Frame boundary (after CRLF normalization)
const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Prefix of payload-carrying lines, separator space included
const DATA_FIELD: &str = "data: ";

/// Substituted for invalid UTF-8 sequences
const REPLACEMENT: &str = "\u{FFFD}";

/// One `data: ` line of a complete frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    /// Line text after the `data: ` prefix
    pub payload: String,
}

impl EventRecord {
    /// Create a record
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// A complete frame: the text between two blank-line boundaries
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    text: String,
}

impl Frame {
    /// Raw frame text, without the trailing blank line
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Records carried by this frame, one per `data: ` line
    ///
    /// Lines are interpreted independently. Only lines starting with
    /// `data: ` carry a payload; a bare `data:` keep-alive, `data:` without
    /// the space, comments (`: ...`) and other fields (`event:`, `id:`,
    /// `retry:`) are skipped.
    pub fn records(&self) -> impl Iterator<Item = EventRecord> + '_ {
        self.text
            .split('\n')
            .filter_map(|line| line.strip_prefix(DATA_FIELD).map(EventRecord::new))
    }
}

/// Decoder state machine for streaming frame parsing
///
/// Buffers incoming bytes and yields complete frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Decoded text not yet split into frames
    buffer: String,
    /// Where the next delimiter search starts
    scan_pos: usize,
    /// Leading bytes of a character cut off by the last chunk
    utf8_tail: Vec<u8>,
    /// The last chunk ended in `\r`; the next byte decides if it was CRLF
    pending_cr: bool,
}

impl FrameDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        if self.utf8_tail.is_empty() {
            self.decode_utf8(chunk);
        } else {
            let mut joined = std::mem::take(&mut self.utf8_tail);
            joined.extend_from_slice(chunk);
            self.decode_utf8(&joined);
        }
    }

    /// Try to take the next complete frame
    ///
    /// Returns `None` when no boundary has arrived yet. The incomplete
    /// remainder stays buffered for the next chunk.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let haystack = &self.buffer.as_bytes()[self.scan_pos..];

        if let Some(offset) = haystack
            .windows(FRAME_DELIMITER.len())
            .position(|w| w == FRAME_DELIMITER)
        {
            let end = self.scan_pos + offset;
            let rest = self.buffer.split_off(end + FRAME_DELIMITER.len());
            let mut text = std::mem::replace(&mut self.buffer, rest);
            text.truncate(end);
            self.scan_pos = 0;
            Some(Frame { text })
        } else {
            // A delimiter may still straddle the current end
            self.scan_pos = self
                .buffer
                .len()
                .saturating_sub(FRAME_DELIMITER.len() - 1);
            None
        }
    }

    /// Drain every complete frame currently buffered
    pub fn frames(&mut self) -> impl Iterator<Item = Frame> + '_ {
        std::iter::from_fn(move || self.next_frame())
    }

    /// Push a chunk and return the records of every frame it completed
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<EventRecord> {
        self.push(chunk);

        let mut records = Vec::new();
        for frame in self.frames() {
            records.extend(frame.records());
        }
        records
    }

    /// Bytes received but not yet resolved into a frame
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len() + self.utf8_tail.len() + usize::from(self.pending_cr)
    }

    /// Discard all buffered state
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scan_pos = 0;
        self.utf8_tail.clear();
        self.pending_cr = false;
    }

    fn decode_utf8(&mut self, mut bytes: &[u8]) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    self.push_text(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.push_text(text);
                    }

                    match err.error_len() {
                        Some(invalid_len) => {
                            self.push_text(REPLACEMENT);
                            bytes = &rest[invalid_len..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes
                            self.utf8_tail = rest.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn push_text(&mut self, mut text: &str) {
        if text.is_empty() {
            return;
        }

        if self.pending_cr {
            self.pending_cr = false;
            match text.strip_prefix('\n') {
                Some(rest) => {
                    self.buffer.push('\n');
                    text = rest;
                }
                None => self.buffer.push('\r'),
            }
        }

        if let Some(head) = text.strip_suffix('\r') {
            self.pending_cr = true;
            text = head;
        }

        if text.contains('\r') {
            self.buffer.push_str(&text.replace("\r\n", "\n"));
        } else {
            self.buffer.push_str(text);
        }
    }
}

/// Turn a stream of raw body chunks into a lazy stream of event records
///
/// Each chunk is decoded as soon as it arrives and the records of every
/// frame it completes are yielded in order. Chunk errors are passed through
/// in position. A trailing fragment without a closing blank line is dropped
/// when the input ends.
pub fn event_records<S, B, E>(chunks: S) -> impl Stream<Item = Result<EventRecord, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    chunks
        .scan(FrameDecoder::new(), |decoder, chunk| {
            let batch: Vec<Result<EventRecord, E>> = match chunk {
                Ok(bytes) => decoder
                    .decode(bytes.as_ref())
                    .into_iter()
                    .map(Ok)
                    .collect(),
                Err(err) => vec![Err(err)],
            };
            future::ready(Some(stream::iter(batch)))
        })
        .flatten()
}
