//! WhatsApp Business Cloud API: webhook handshake, payload classification, outbound text.

mod payload;
mod sender;
mod verify;

pub use payload::{classify, WebhookEnvelope, BUSINESS_ACCOUNT_OBJECT};
pub use sender::{OutboundMessage, WhatsAppError, WhatsAppSender};
pub use verify::{verify_handshake, HandshakeError, VerifyQuery};
