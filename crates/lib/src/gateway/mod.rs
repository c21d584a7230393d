//! Gateway: the HTTP surface of the relay.
//!
//! Single port serves `GET /` (liveness), `GET /webhook` (handshake) and `POST /webhook`
//! (deliveries). Outbound clients live for exactly as long as the server does.

mod server;

pub use server::{
    build_state, completion_responder, router, run_gateway, whatsapp_sender, GatewayState,
};
