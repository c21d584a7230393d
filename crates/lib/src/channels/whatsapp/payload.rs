//! Webhook payload: envelope parsing and classification into a single [`InboundEvent`].
//!
//! Only the first entry, first change, and first message or status are considered.
//! A missing key or empty list while descending yields `Unrecognized(Malformed)`, which the
//! gateway still acknowledges with 200 so the platform does not record a delivery failure.

use crate::channels::{InboundEvent, UnrecognizedShape};
use serde::Deserialize;
use serde_json::Value;

/// Value of the top-level `object` field for WhatsApp Business deliveries.
pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

/// Raw inbound delivery: the discriminator plus opaque entry records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookEnvelope {
    pub object: Option<String>,
    pub entries: Vec<Value>,
}

impl WebhookEnvelope {
    /// Split a delivery body into discriminator and entries. Never fails: a non-object body has no `object`.
    pub fn from_json(mut body: Value) -> Self {
        let object = body
            .get("object")
            .and_then(Value::as_str)
            .map(str::to_string);
        let entries = match body.get_mut("entry").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        Self { object, entries }
    }

    pub fn is_business_account(&self) -> bool {
        self.object.as_deref() == Some(BUSINESS_ACCOUNT_OBJECT)
    }
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    value: Option<ChangeValue>,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Option<Vec<Value>>,
    #[serde(default)]
    statuses: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct StatusRecord {
    id: String,
    status: String,
}

/// Classify one delivery into exactly one event.
pub fn classify(envelope: &WebhookEnvelope) -> InboundEvent {
    if !envelope.is_business_account() {
        return InboundEvent::Unrecognized {
            shape: UnrecognizedShape::ForeignObject(envelope.object.clone()),
        };
    }
    let Some(first_entry) = envelope.entries.first() else {
        return InboundEvent::malformed("entry list is empty");
    };
    let Ok(entry) = Entry::deserialize(first_entry) else {
        return InboundEvent::malformed("entry is not an object with changes");
    };
    let Some(value) = entry.changes.into_iter().next().and_then(|c| c.value) else {
        return InboundEvent::malformed("first change has no value");
    };

    if let Some(statuses) = value.statuses {
        return classify_status(statuses.first());
    }
    if let Some(messages) = value.messages {
        return classify_message(messages.first());
    }
    InboundEvent::Unrecognized {
        shape: UnrecognizedShape::NoEvent,
    }
}

fn classify_status(first: Option<&Value>) -> InboundEvent {
    let Some(raw) = first else {
        return InboundEvent::malformed("statuses list is empty");
    };
    match StatusRecord::deserialize(raw) {
        Ok(s) => InboundEvent::StatusUpdate {
            message_id: s.id,
            status: s.status,
        },
        Err(_) => InboundEvent::malformed("status is missing id or status"),
    }
}

fn classify_message(first: Option<&Value>) -> InboundEvent {
    let Some(raw) = first else {
        return InboundEvent::malformed("messages list is empty");
    };
    let Some(record) = raw.as_object() else {
        return InboundEvent::malformed("message is not an object");
    };
    match record.get("type").and_then(Value::as_str) {
        Some("text") => {}
        other => {
            return InboundEvent::Unrecognized {
                shape: UnrecognizedShape::UnsupportedMessage(other.unwrap_or_default().to_string()),
            }
        }
    }
    let sender_id = match record.get("from") {
        None | Some(Value::Null) => return InboundEvent::malformed("text message has no sender"),
        Some(Value::String(from)) => from.clone(),
        Some(_) => return InboundEvent::malformed("text message sender is not a string"),
    };
    let body = match record.get("text").map(|t| t.get("body")) {
        None | Some(None) | Some(Some(Value::Null)) => {
            return InboundEvent::malformed("text message has no body")
        }
        Some(Some(Value::String(body))) => body.clone(),
        Some(Some(_)) => return InboundEvent::malformed("text message body is not a string"),
    };
    InboundEvent::TextMessage {
        sender_id,
        body,
        message_id: record.get("id").and_then(Value::as_str).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_with_value(value: Value) -> WebhookEnvelope {
        WebhookEnvelope::from_json(json!({
            "object": BUSINESS_ACCOUNT_OBJECT,
            "entry": [{ "id": "1", "changes": [{ "field": "messages", "value": value }] }]
        }))
    }

    #[test]
    fn text_message_is_classified() {
        let env = envelope_with_value(json!({
            "messaging_product": "whatsapp",
            "messages": [{
                "from": "15551234567",
                "id": "wamid.ABC",
                "timestamp": "1700000000",
                "type": "text",
                "text": { "body": "hi" }
            }]
        }));
        assert_eq!(
            classify(&env),
            InboundEvent::TextMessage {
                sender_id: "15551234567".into(),
                body: "hi".into(),
                message_id: Some("wamid.ABC".into()),
            }
        );
    }

    #[test]
    fn only_first_message_is_used() {
        let env = envelope_with_value(json!({
            "messages": [
                { "from": "1", "type": "text", "text": { "body": "first" } },
                { "from": "2", "type": "text", "text": { "body": "second" } }
            ]
        }));
        match classify(&env) {
            InboundEvent::TextMessage { sender_id, body, .. } => {
                assert_eq!(sender_id, "1");
                assert_eq!(body, "first");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn status_update_is_classified() {
        let env = envelope_with_value(json!({
            "statuses": [{ "id": "wamid.XYZ", "status": "delivered", "recipient_id": "15551234567" }]
        }));
        assert_eq!(
            classify(&env),
            InboundEvent::StatusUpdate {
                message_id: "wamid.XYZ".into(),
                status: "delivered".into(),
            }
        );
    }

    #[test]
    fn statuses_take_precedence_over_messages() {
        let env = envelope_with_value(json!({
            "statuses": [{ "id": "s1", "status": "read" }],
            "messages": [{ "from": "1", "type": "text", "text": { "body": "hi" } }]
        }));
        assert!(matches!(classify(&env), InboundEvent::StatusUpdate { .. }));
    }

    #[test]
    fn non_text_message_is_unsupported() {
        let env = envelope_with_value(json!({
            "messages": [{ "from": "1", "type": "image", "image": { "id": "m1" } }]
        }));
        assert_eq!(
            classify(&env),
            InboundEvent::Unrecognized {
                shape: UnrecognizedShape::UnsupportedMessage("image".into())
            }
        );
    }

    #[test]
    fn foreign_object_is_rejected() {
        let env = WebhookEnvelope::from_json(json!({ "object": "page", "entry": [] }));
        let event = classify(&env);
        assert!(event.is_foreign());
        assert_eq!(
            event,
            InboundEvent::Unrecognized {
                shape: UnrecognizedShape::ForeignObject(Some("page".into()))
            }
        );
    }

    #[test]
    fn non_object_body_is_foreign() {
        let env = WebhookEnvelope::from_json(json!([1, 2, 3]));
        assert_eq!(env, WebhookEnvelope::default());
        assert!(classify(&env).is_foreign());
    }

    #[test]
    fn malformed_descent_is_unrecognized_not_foreign() {
        let cases = vec![
            json!({ "object": BUSINESS_ACCOUNT_OBJECT }),
            json!({ "object": BUSINESS_ACCOUNT_OBJECT, "entry": "nope" }),
            json!({ "object": BUSINESS_ACCOUNT_OBJECT, "entry": [] }),
            json!({ "object": BUSINESS_ACCOUNT_OBJECT, "entry": [{ "changes": [] }] }),
            json!({ "object": BUSINESS_ACCOUNT_OBJECT, "entry": [{ "changes": [{ "field": "messages" }] }] }),
            json!({ "object": BUSINESS_ACCOUNT_OBJECT, "entry": [{ "changes": "x" }] }),
        ];
        for body in cases {
            let event = classify(&WebhookEnvelope::from_json(body.clone()));
            assert!(
                matches!(
                    event,
                    InboundEvent::Unrecognized {
                        shape: UnrecognizedShape::Malformed(_)
                    }
                ),
                "{} -> {:?}",
                body,
                event
            );
        }
    }

    #[test]
    fn empty_or_incomplete_records_are_malformed() {
        let cases = vec![
            json!({ "statuses": [] }),
            json!({ "statuses": [{ "id": "s1" }] }),
            json!({ "messages": [] }),
            json!({ "messages": [{ "type": "text", "text": { "body": "hi" } }] }),
            json!({ "messages": [{ "type": "text", "from": "1" }] }),
            json!({ "messages": ["text"] }),
        ];
        for value in cases {
            let event = classify(&envelope_with_value(value.clone()));
            assert!(
                matches!(
                    event,
                    InboundEvent::Unrecognized {
                        shape: UnrecognizedShape::Malformed(_)
                    }
                ),
                "{} -> {:?}",
                value,
                event
            );
        }
    }

    #[test]
    fn malformed_reason_names_the_offending_field() {
        let cases = vec![
            (json!({ "messages": ["text"] }), "message is not an object"),
            (json!({ "messages": [{ "type": "text", "from": "1", "text": {} }] }), "text message has no body"),
            (json!({ "messages": [{ "type": "text", "from": "1", "text": "hi" }] }), "text message has no body"),
            (
                json!({ "messages": [{ "type": "text", "from": "1", "text": { "body": 7 } }] }),
                "text message body is not a string",
            ),
            (
                json!({ "messages": [{ "type": "text", "from": 15551234567u64, "text": { "body": "hi" } }] }),
                "text message sender is not a string",
            ),
            (json!({ "messages": [{ "type": "text", "from": null, "text": { "body": "hi" } }] }), "text message has no sender"),
        ];
        for (value, reason) in cases {
            assert_eq!(
                classify(&envelope_with_value(value.clone())),
                InboundEvent::malformed(reason),
                "{}",
                value
            );
        }
    }

    #[test]
    fn message_id_is_optional() {
        let env = envelope_with_value(json!({
            "messages": [{ "type": "text", "from": "1", "id": 9, "text": { "body": "hi" } }]
        }));
        assert_eq!(
            classify(&env),
            InboundEvent::TextMessage {
                sender_id: "1".into(),
                body: "hi".into(),
                message_id: None,
            }
        );
    }

    #[test]
    fn value_without_messages_or_statuses_is_no_event() {
        let env = envelope_with_value(json!({ "messaging_product": "whatsapp", "contacts": [] }));
        assert_eq!(
            classify(&env),
            InboundEvent::Unrecognized {
                shape: UnrecognizedShape::NoEvent
            }
        );
    }
}
