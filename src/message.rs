//! Message protocol definitions
//!
//! Every exchange is a `{ kind, status, payload }` envelope serialized as
//! JSON. Validity is checked separately from construction: an envelope is
//! valid when both `kind` and `status` are non-empty strings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Kind of a freshly posted chat message (payload: one `ChatLogEntry`)
pub const CHAT_LOG: &str = "chat-log";

/// Kind of a history replay (payload: array of `ChatLogEntry`)
pub const CHAT_HISTORY: &str = "chat-history";

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILURE: &str = "failure";

/// Message envelope
///
/// `kind` and `status` default to empty strings when absent, so `{}`
/// decodes into an (invalid) message rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Build a message with no payload. No validation is performed.
pub fn make_message(kind: impl Into<String>, status: impl Into<String>) -> Message {
    Message {
        kind: kind.into(),
        status: status.into(),
        payload: Value::Null,
    }
}

impl Message {
    /// Attach a payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Deserialize the payload into a handler-defined shape
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Check that both `kind` and `status` are non-empty
pub fn is_valid_message(msg: &Message) -> bool {
    !msg.kind.is_empty() && !msg.status.is_empty()
}

/// Same check over arbitrary JSON
///
/// Total: any value that is not an object carrying non-empty string
/// `kind` and `status` fields is invalid.
pub fn is_valid_message_value(value: &Value) -> bool {
    let non_empty = |field: &str| {
        value
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    value.is_object() && non_empty("kind") && non_empty("status")
}

/// Decode one frame of text into a batch of messages
///
/// Accepts a single JSON object or an array of objects. Elements that
/// cannot be shaped into a `Message` (e.g. a numeric `kind`) are dropped;
/// only text that is not JSON at all is an error.
pub fn decode_batch(text: &str) -> Result<Vec<Message>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            debug!("Ignoring non-object frame: {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Message>(item) {
            Ok(msg) => Some(msg),
            Err(e) => {
                debug!("Dropping malformed message: {}", e);
                None
            }
        })
        .collect())
}

/// One posted chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub author: String,
    pub text: String,
}

impl ChatLogEntry {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    fn to_value(&self) -> Value {
        json!({ "author": self.author, "text": self.text })
    }
}

/// `chat-log`/`success` message carrying one entry
pub fn chat_log_message(entry: &ChatLogEntry) -> Message {
    make_message(CHAT_LOG, STATUS_SUCCESS).with_payload(entry.to_value())
}

/// `chat-history`/`success` message carrying exactly the given entries, in order
pub fn chat_history_message(history: &[ChatLogEntry]) -> Message {
    let entries = history.iter().map(ChatLogEntry::to_value).collect();
    make_message(CHAT_HISTORY, STATUS_SUCCESS).with_payload(Value::Array(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_well_formed() {
        for (kind, status) in [("test", "success"), ("chat-log", "failure"), ("k", "s")] {
            assert!(is_valid_message(&make_message(kind, status)));
            assert!(is_valid_message(
                &make_message(kind, status).with_payload(json!({ "any": [1, 2] }))
            ));
        }
    }

    #[test]
    fn test_empty_message_is_invalid() {
        assert!(!is_valid_message(&Message::default()));
        assert!(!is_valid_message_value(&json!({})));

        let decoded: Message = serde_json::from_str("{}").unwrap();
        assert!(!is_valid_message(&decoded));
    }

    #[test]
    fn test_empty_strings_are_constructible_but_invalid() {
        assert!(!is_valid_message(&make_message("", "success")));
        assert!(!is_valid_message(&make_message("test", "")));
    }

    #[test]
    fn test_value_predicate_is_total() {
        assert!(is_valid_message_value(&json!({ "kind": "test", "status": "success" })));
        assert!(!is_valid_message_value(&Value::Null));
        assert!(!is_valid_message_value(&json!("test")));
        assert!(!is_valid_message_value(&json!([{ "kind": "test", "status": "ok" }])));
        assert!(!is_valid_message_value(&json!({ "kind": 1, "status": "success" })));
        assert!(!is_valid_message_value(&json!({ "kind": "test" })));
    }

    #[test]
    fn test_payload_omitted_when_absent() {
        let json = make_message("test", "success").to_json().unwrap();
        assert_eq!(json, r#"{"kind":"test","status":"success"}"#);
    }

    #[test]
    fn test_decode_batch_single_and_array() {
        let single = decode_batch(r#"{"kind":"a","status":"b"}"#).unwrap();
        assert_eq!(single, vec![make_message("a", "b")]);

        let batch =
            decode_batch(r#"[{"kind":"test","status":"failure"},{"kind":"test","status":"success"}]"#)
                .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].status, "failure");
        assert_eq!(batch[1].status, "success");
    }

    #[test]
    fn test_decode_batch_drops_unshapeable_elements() {
        let batch = decode_batch(r#"[{"kind":7,"status":"x"},{"kind":"ok","status":"x"},3]"#).unwrap();
        assert_eq!(batch, vec![make_message("ok", "x")]);

        assert!(decode_batch("42").unwrap().is_empty());
        assert!(decode_batch("not json").is_err());
    }

    #[test]
    fn test_chat_log_message_payload() {
        let entry = ChatLogEntry::new("alice", "hello");
        let msg = chat_log_message(&entry);

        assert_eq!(msg.kind, CHAT_LOG);
        assert_eq!(msg.status, STATUS_SUCCESS);
        assert_eq!(msg.payload_as::<ChatLogEntry>().unwrap(), entry);
    }

    #[test]
    fn test_chat_history_uses_its_own_argument() {
        let history = vec![ChatLogEntry::new("a", "1"), ChatLogEntry::new("b", "2")];
        let msg = chat_history_message(&history);

        assert_eq!(msg.kind, CHAT_HISTORY);
        assert_eq!(msg.payload_as::<Vec<ChatLogEntry>>().unwrap(), history);

        let empty = chat_history_message(&[]);
        assert_eq!(empty.payload, json!([]));
    }
}
