//! Event Interpreter
//!
//! Classifies the payload of one `data:` line.
//!
//! | Payload | Result |
//! |---|---|
//! | `[DONE]` | [`StreamEvent::Done`] |
//! | `{"type":"token","content":"..."}` | [`StreamEvent::Token`] |
//! | `{"type":"done"}` | [`StreamEvent::Done`] |
//! | `{"type":"tool_call","name":"...","args":{...}}` | [`StreamEvent::ToolCall`] |
//! | any other object | [`StreamEvent::Ignored`] |
//! | anything else | [`ChatError::Protocol`] |
//!
//! Unknown `type` values are ignored so that new event kinds on the server
//! never abort a client that predates them. Undecodable payloads abort the
//! session instead of being skipped.

use serde_json::Value;

use crate::error::ChatError;

/// Close-of-stream sentinel payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// A decoded event
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// A fragment of assistant text
    Token(String),
    /// No further content will follow
    Done,
    /// The endpoint invoked a tool; informational only
    ToolCall {
        /// Tool name
        name: String,
        /// Tool arguments as sent
        args: Value,
    },
    /// A well-formed record of a kind this client does not handle
    Ignored {
        /// The `type` discriminator, if present
        kind: Option<String>,
    },
}

/// Interpret one payload
pub fn interpret(payload: &str) -> Result<StreamEvent, ChatError> {
    if payload == DONE_SENTINEL {
        return Ok(StreamEvent::Done);
    }

    let value: Value =
        serde_json::from_str(payload).map_err(|e| ChatError::protocol(payload, e.to_string()))?;

    let Value::Object(record) = value else {
        return Err(ChatError::protocol(payload, "expected a JSON object"));
    };

    let kind = record.get("type").and_then(Value::as_str);

    match kind {
        Some("token") => match record.get("content") {
            Some(Value::String(content)) => Ok(StreamEvent::Token(content.clone())),
            _ => Err(ChatError::protocol(
                payload,
                "token record without string content",
            )),
        },
        Some("done") => Ok(StreamEvent::Done),
        Some("tool_call") => Ok(StreamEvent::ToolCall {
            name: record
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            args: record.get("args").cloned().unwrap_or(Value::Null),
        }),
        other => Ok(StreamEvent::Ignored {
            kind: other.map(String::from),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_done_sentinel() {
        assert_eq!(interpret("[DONE]").unwrap(), StreamEvent::Done);
    }

    #[test]
    fn test_token() {
        let event = interpret(r#"{"type":"token","content":"Hel"}"#).unwrap();
        assert_eq!(event, StreamEvent::Token("Hel".to_string()));
    }

    #[test]
    fn test_token_preserves_whitespace_and_unicode() {
        let event = interpret(r#"{"type":"token","content":" é\n"}"#).unwrap();
        assert_eq!(event, StreamEvent::Token(" \u{e9}\n".to_string()));
    }

    #[test]
    fn test_done_record() {
        assert_eq!(interpret(r#"{"type":"done"}"#).unwrap(), StreamEvent::Done);
    }

    #[test]
    fn test_tool_call() {
        let event =
            interpret(r#"{"type":"tool_call","name":"search","args":{"q":"rust"}}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::ToolCall {
                name: "search".to_string(),
                args: serde_json::json!({"q": "rust"}),
            }
        );
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let event = interpret(r#"{"type":"usage","tokens":42}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Ignored {
                kind: Some("usage".to_string())
            }
        );
    }

    #[test]
    fn test_missing_type_is_ignored() {
        let event = interpret(r#"{"content":"orphan"}"#).unwrap();
        assert_eq!(event, StreamEvent::Ignored { kind: None });
    }

    #[test]
    fn test_invalid_json_is_protocol_error() {
        let err = interpret("{not json").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Protocol);
    }

    #[test]
    fn test_non_object_is_protocol_error() {
        assert!(matches!(
            interpret("42"),
            Err(ChatError::Protocol { .. })
        ));
        assert!(matches!(
            interpret("DONE"),
            Err(ChatError::Protocol { .. })
        ));
    }

    #[test]
    fn test_token_without_content_is_protocol_error() {
        assert!(matches!(
            interpret(r#"{"type":"token"}"#),
            Err(ChatError::Protocol { .. })
        ));
        assert!(matches!(
            interpret(r#"{"type":"token","content":7}"#),
            Err(ChatError::Protocol { .. })
        ));
    }
}
