//! Communication channels (WhatsApp Business Cloud API).
//!
//! Inbound deliveries are classified into [`InboundEvent`]s; replies leave through a [`MessageDispatcher`].

mod inbound;
mod outbound;
pub mod whatsapp;

pub use inbound::{InboundEvent, UnrecognizedShape};
pub use outbound::MessageDispatcher;
