//! Outbound side of a channel: deliver a reply to a conversation.

use async_trait::async_trait;

/// Sends text to a conversation. Delivery failures are logged by the implementation, not returned.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Channel id (e.g. "whatsapp").
    fn id(&self) -> &str;
    /// Send `body` to `recipient_id`.
    async fn send(&self, recipient_id: &str, body: &str);
}
