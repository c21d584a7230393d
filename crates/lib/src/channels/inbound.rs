//! Inbound event from a channel: the typed result of classifying one webhook delivery.

/// What one delivery asks the relay to do. Produced once at the boundary; downstream code never sees raw JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A text message to answer.
    TextMessage {
        sender_id: String,
        body: String,
        message_id: Option<String>,
    },
    /// Delivery/read receipt for a message we sent. Acknowledged only.
    StatusUpdate { message_id: String, status: String },
    /// Anything else; `shape` says why.
    Unrecognized { shape: UnrecognizedShape },
}

/// Why a delivery did not classify as a message or a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrecognizedShape {
    /// Top-level `object` was not the business-account marker (or was missing).
    ForeignObject(Option<String>),
    /// A required key was missing or a list was empty while descending.
    Malformed(&'static str),
    /// A message of a type other than text (image, audio, reaction, ...).
    UnsupportedMessage(String),
    /// The change value carried neither messages nor statuses.
    NoEvent,
}

impl InboundEvent {
    pub fn malformed(reason: &'static str) -> Self {
        InboundEvent::Unrecognized {
            shape: UnrecognizedShape::Malformed(reason),
        }
    }

    /// True when the delivery did not come from the expected source at all.
    pub fn is_foreign(&self) -> bool {
        matches!(
            self,
            InboundEvent::Unrecognized {
                shape: UnrecognizedShape::ForeignObject(_)
            }
        )
    }
}
