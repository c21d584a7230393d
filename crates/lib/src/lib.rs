//! warelay core library: WhatsApp webhook gateway, payload classification, reply generation
//! and outbound delivery, used by the CLI.

pub mod channels;
pub mod clients;
pub mod config;
pub mod gateway;
pub mod llm;
pub mod pipeline;
pub mod responder;
