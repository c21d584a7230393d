//! Webhook verification handshake (`GET /webhook?hub.mode=subscribe&hub.verify_token=..&hub.challenge=..`).

use serde::Deserialize;

/// Query parameters sent by the platform when registering the webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    /// Mode and token present but wrong (403).
    #[error("verify token or mode mismatch")]
    Mismatch,
    /// Mode or token missing (400).
    #[error("hub.mode or hub.verify_token missing")]
    Incomplete,
}

/// Returns the challenge to echo back when mode is "subscribe" and the token matches `expected`.
/// Empty parameters count as missing. With no configured token every complete request is a mismatch.
pub fn verify_handshake(query: &VerifyQuery, expected: Option<&str>) -> Result<String, HandshakeError> {
    let (Some(mode), Some(token)) = (present(&query.mode), present(&query.token)) else {
        return Err(HandshakeError::Incomplete);
    };
    if mode == "subscribe" && expected.is_some_and(|e| e == token) {
        Ok(query.challenge.clone().unwrap_or_default())
    } else {
        Err(HandshakeError::Mismatch)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
