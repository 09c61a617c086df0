//! The client-submitted `Message` and its normalization rules.
//!
//! The gateway does not interpret `parts`; it forwards the object opaquely
//! to the workflow. A bare string or `{message: string}` input is also
//! accepted and normalized into the standard shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One part of a message. `kind` and `type` are accepted as synonyms on
/// the wire (the Google A2A SDK shape uses `type`; v0.2.5 uses `kind`);
/// both deserialize into the same field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Part {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            file: None,
            data: None,
        }
    }
}

/// `{ messageId, role, parts }`, forwarded opaquely to the workflow as the
/// Task's `input`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub message_id: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

fn default_role() -> String {
    "user".to_string()
}

/// Normalize a raw `message/send` or `message/stream` `message` field into
/// the standard `{messageId, role, parts}` shape.
///
/// Accepts, in order of preference:
/// - an object already matching [`Message`]'s shape;
/// - a bare string, treated as a single text part;
/// - `{message: string}`, likewise.
#[must_use]
pub fn normalize_message_input(raw: &Value) -> Value {
    if raw.is_string() {
        let text = raw.as_str().unwrap_or_default();
        return serde_json::to_value(Message {
            message_id: String::new(),
            role: default_role(),
            parts: vec![Part::text(text)],
        })
        .unwrap_or(Value::Null);
    }

    if let Some(obj) = raw.as_object() {
        if let Some(Value::String(text)) = obj.get("message") {
            return serde_json::to_value(Message {
                message_id: String::new(),
                role: default_role(),
                parts: vec![Part::text(text.clone())],
            })
            .unwrap_or(Value::Null);
        }
    }

    raw.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_standard_shape_unmodified() {
        let raw = json!({"messageId": "m1", "role": "user", "parts": [{"type": "text", "text": "hi"}]});
        let normalized = normalize_message_input(&raw);
        assert_eq!(normalized["messageId"], "m1");
    }

    #[test]
    fn normalizes_bare_string() {
        let raw = json!("Hello");
        let normalized = normalize_message_input(&raw);
        assert_eq!(normalized["parts"][0]["text"], "Hello");
        assert_eq!(normalized["parts"][0]["kind"], "text");
    }

    #[test]
    fn normalizes_message_wrapper_shape() {
        let raw = json!({"message": "Hello"});
        let normalized = normalize_message_input(&raw);
        assert_eq!(normalized["parts"][0]["text"], "Hello");
    }

    #[test]
    fn part_type_alias_deserializes_into_kind() {
        let part: Part = serde_json::from_value(json!({"type": "text", "text": "hi"})).unwrap();
        assert_eq!(part.kind, "text");
    }
}
