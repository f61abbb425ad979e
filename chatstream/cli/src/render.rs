//! Snapshot rendering
//!
//! Turns successive [`ChatSnapshot`]s into terminal text. The renderer
//! remembers how much of each message it has already written and emits only
//! what changed, so it works the same whether it sees every snapshot or
//! only the latest of a burst. Markdown is printed verbatim.

use chatstream_core::{ChatSnapshot, MessageId, MessageRole};

/// Notice written when the transcript is emptied
pub const CLEARED_NOTICE: &str = "[conversation cleared]";

/// Notice written when a failed reply is removed
pub const DISCARDED_NOTICE: &str = "[reply discarded]";

#[derive(Clone, Copy, Debug)]
struct Printed {
    id: MessageId,
    role: MessageRole,
    len: usize,
}

/// Incremental snapshot renderer
#[derive(Debug)]
pub struct Renderer {
    /// Role headers, user turns, errors and notices
    full: bool,
    printed: Vec<Printed>,
    at_line_start: bool,
    was_streaming: bool,
    last_error: Option<String>,
}

impl Renderer {
    /// Render the whole conversation
    #[must_use]
    pub fn transcript() -> Self {
        Self::with_mode(true)
    }

    /// Render only assistant text, for one-shot use
    #[must_use]
    pub fn reply_only() -> Self {
        Self::with_mode(false)
    }

    fn with_mode(full: bool) -> Self {
        Self {
            full,
            printed: Vec::new(),
            at_line_start: true,
            was_streaming: false,
            last_error: None,
        }
    }

    /// Text to write to bring the terminal up to `snapshot`
    pub fn render(&mut self, snapshot: &ChatSnapshot) -> String {
        let mut out = String::new();

        self.render_removals(snapshot, &mut out);

        for (index, message) in snapshot.messages.iter().enumerate() {
            if let Some(printed) = self.printed.get_mut(index) {
                let from = printed.len;
                printed.len = message.content.len();
                if message.content.len() > from && message.content.is_char_boundary(from) {
                    let delta = &message.content[from..];
                    if message.role == MessageRole::Assistant || self.full {
                        Self::push(&mut out, &mut self.at_line_start, delta);
                    }
                }
                continue;
            }

            self.printed.push(Printed {
                id: message.id,
                role: message.role,
                len: message.content.len(),
            });

            match message.role {
                MessageRole::User if self.full => {
                    self.line_break(&mut out);
                    let line = format!("{}: {}\n", message.role.label(), message.content);
                    Self::push(&mut out, &mut self.at_line_start, &line);
                }
                MessageRole::User => {}
                MessageRole::Assistant => {
                    if self.full {
                        self.line_break(&mut out);
                        let header = format!("{}: ", message.role.label());
                        Self::push(&mut out, &mut self.at_line_start, &header);
                    }
                    Self::push(&mut out, &mut self.at_line_start, &message.content);
                }
            }
        }

        if self.was_streaming && !snapshot.is_streaming {
            self.line_break(&mut out);
        }
        self.was_streaming = snapshot.is_streaming;

        if snapshot.error != self.last_error {
            if let (Some(error), true) = (&snapshot.error, self.full) {
                self.line_break(&mut out);
                let line = format!("[error] {error}\n");
                Self::push(&mut out, &mut self.at_line_start, &line);
            }
            self.last_error.clone_from(&snapshot.error);
        }

        out
    }

    /// Text to write once nothing more will be rendered
    pub fn finish(&mut self) -> String {
        let mut out = String::new();
        self.line_break(&mut out);
        out
    }

    /// Forget printed messages that are no longer in the transcript
    fn render_removals(&mut self, snapshot: &ChatSnapshot, out: &mut String) {
        let kept = self
            .printed
            .iter()
            .zip(&snapshot.messages)
            .take_while(|(printed, message)| printed.id == message.id)
            .count();

        if kept == self.printed.len() {
            return;
        }

        let dropped_reply = self.printed[kept..]
            .iter()
            .any(|p| p.role == MessageRole::Assistant);
        self.printed.truncate(kept);

        if !self.full {
            return;
        }
        self.line_break(out);
        if snapshot.messages.is_empty() {
            Self::push(out, &mut self.at_line_start, &format!("{CLEARED_NOTICE}\n"));
        } else if dropped_reply {
            Self::push(out, &mut self.at_line_start, &format!("{DISCARDED_NOTICE}\n"));
        }
    }

    fn line_break(&mut self, out: &mut String) {
        if !self.at_line_start {
            Self::push(out, &mut self.at_line_start, "\n");
        }
    }

    fn push(out: &mut String, at_line_start: &mut bool, text: &str) {
        if text.is_empty() {
            return;
        }
        out.push_str(text);
        *at_line_start = text.ends_with('\n');
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use chatstream_core::{Message, SessionPhase};

    fn snapshot(messages: &[Message], phase: SessionPhase, error: Option<&str>) -> ChatSnapshot {
        ChatSnapshot {
            messages: messages.to_vec(),
            is_streaming: phase != SessionPhase::Idle,
            error: error.map(String::from),
            phase,
        }
    }

    fn reply(content: &str) -> Message {
        let mut message = Message::assistant_placeholder();
        message.content = content.to_string();
        message
    }

    #[test]
    fn test_streams_deltas_once() {
        let user = Message::user("Hi");
        let mut assistant = reply("");
        let mut renderer = Renderer::transcript();

        let first = renderer.render(&snapshot(
            &[user.clone(), assistant.clone()],
            SessionPhase::Sending,
            None,
        ));
        assert_eq!(first, "You: Hi\nAssistant: ");

        assistant.content = "Hel".to_string();
        let second = renderer.render(&snapshot(
            &[user.clone(), assistant.clone()],
            SessionPhase::Streaming,
            None,
        ));
        assert_eq!(second, "Hel");

        assistant.content = "Hello".to_string();
        let last = renderer.render(&snapshot(&[user, assistant], SessionPhase::Idle, None));
        assert_eq!(last, "lo\n");
    }

    #[test]
    fn test_unchanged_snapshot_renders_nothing() {
        let messages = [Message::user("Hi"), reply("Hello")];
        let mut renderer = Renderer::transcript();
        renderer.render(&snapshot(&messages, SessionPhase::Idle, None));
        assert_eq!(renderer.render(&snapshot(&messages, SessionPhase::Idle, None)), "");
    }

    #[test]
    fn test_error_and_rollback() {
        let user = Message::user("Hi");
        let mut renderer = Renderer::transcript();
        renderer.render(&snapshot(
            &[user.clone(), reply("Hel")],
            SessionPhase::Streaming,
            None,
        ));

        let out = renderer.render(&snapshot(&[user], SessionPhase::Idle, Some("HTTP 500")));
        assert_eq!(out, format!("\n{DISCARDED_NOTICE}\n[error] HTTP 500\n"));
    }

    #[test]
    fn test_clear_notice() {
        let mut renderer = Renderer::transcript();
        renderer.render(&snapshot(
            &[Message::user("Hi"), reply("Hello")],
            SessionPhase::Idle,
            None,
        ));

        let out = renderer.render(&ChatSnapshot::default());
        assert_eq!(out, format!("\n{CLEARED_NOTICE}\n"));
    }

    #[test]
    fn test_multibyte_deltas() {
        let user = Message::user("Hi");
        let mut assistant = reply("Grü");
        let mut renderer = Renderer::reply_only();

        let mut out = renderer.render(&snapshot(
            &[user.clone(), assistant.clone()],
            SessionPhase::Streaming,
            None,
        ));
        assistant.content = "Grüße 🌍".to_string();
        out.push_str(&renderer.render(&snapshot(
            &[user, assistant],
            SessionPhase::Streaming,
            None,
        )));
        out.push_str(&renderer.finish());

        assert_eq!(out, "Grüße 🌍\n");
    }

    #[test]
    fn test_reply_only_skips_user_and_errors() {
        let user = Message::user("Hi");
        let mut renderer = Renderer::reply_only();
        let out = renderer.render(&snapshot(
            &[user.clone(), reply("")],
            SessionPhase::Sending,
            None,
        ));
        assert_eq!(out, "");

        let out = renderer.render(&snapshot(&[user], SessionPhase::Idle, Some("HTTP 502")));
        assert_eq!(out, "");
    }

    #[test]
    fn test_coalesced_snapshots() {
        let first = Message::user("one");
        let mut answer = reply("a");
        let second = Message::user("two");
        let mut renderer = Renderer::transcript();

        renderer.render(&snapshot(
            &[first.clone(), answer.clone()],
            SessionPhase::Streaming,
            None,
        ));
        // Stop and a new send land between two renders
        answer.content = "ab".to_string();
        let out = renderer.render(&snapshot(
            &[first, answer, second, reply("")],
            SessionPhase::Sending,
            None,
        ));
        assert_eq!(out, "b\nYou: two\nAssistant: ");
    }
}
