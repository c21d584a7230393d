//! Outbound text messages via the Graph API: `POST {base}/{version}/{phone_number_id}/messages`.

use crate::channels::MessageDispatcher;
use crate::clients::{ClientError, ClientHandle};
use async_trait::async_trait;
use serde::Serialize;

const GRAPH_API_BASE: &str = "https://graph.facebook.com";
const GRAPH_API_VERSION: &str = "v18.0";

#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    #[error("whatsapp {0} not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("whatsapp request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("whatsapp api error: {status} {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Text message payload in Cloud API format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    messaging_product: &'static str,
    to: String,
    #[serde(rename = "type")]
    kind: &'static str,
    text: OutboundText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct OutboundText {
    body: String,
}

impl OutboundMessage {
    pub fn text(recipient_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: recipient_id.into(),
            kind: "text",
            text: OutboundText { body: body.into() },
        }
    }

    pub fn recipient_id(&self) -> &str {
        &self.to
    }

    pub fn body(&self) -> &str {
        &self.text.body
    }
}

/// Sends replies through the shared messaging client.
#[derive(Clone)]
pub struct WhatsAppSender {
    id: String,
    api_base: String,
    api_version: String,
    token: Option<String>,
    phone_number_id: Option<String>,
    http: ClientHandle,
}

impl WhatsAppSender {
    pub fn new(
        token: Option<String>,
        phone_number_id: Option<String>,
        http: ClientHandle,
    ) -> Self {
        Self {
            id: "whatsapp".to_string(),
            api_base: GRAPH_API_BASE.to_string(),
            api_version: GRAPH_API_VERSION.to_string(),
            token,
            phone_number_id,
            http,
        }
    }

    /// Override the Graph API root and version (custom endpoints or tests).
    pub fn with_api(mut self, base: &str, version: &str) -> Self {
        let base = base.trim_end_matches('/');
        if !base.is_empty() {
            self.api_base = base.to_string();
        }
        let version = version.trim_matches('/');
        if !version.is_empty() {
            self.api_version = version.to_string();
        }
        self
    }

    fn messages_url(&self) -> Result<String, WhatsAppError> {
        let phone_number_id = self
            .phone_number_id
            .as_deref()
            .ok_or(WhatsAppError::NotConfigured("phone number id"))?;
        Ok(format!(
            "{}/{}/{}/messages",
            self.api_base, self.api_version, phone_number_id
        ))
    }

    /// Send a text message; returns the API response JSON on 2xx.
    pub async fn try_send(
        &self,
        recipient_id: &str,
        body: &str,
    ) -> Result<serde_json::Value, WhatsAppError> {
        let token = self
            .token
            .as_deref()
            .ok_or(WhatsAppError::NotConfigured("access token"))?;
        let url = self.messages_url()?;
        let payload = OutboundMessage::text(recipient_id, body);
        let res = self
            .http
            .client()?
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api { status, body });
        }
        // Some proxies answer 2xx with an empty body; that still counts as sent.
        let text = res.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl MessageDispatcher for WhatsAppSender {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, recipient_id: &str, body: &str) {
        match self.try_send(recipient_id, body).await {
            Ok(response) => log::info!("whatsapp api response: {}", response),
            Err(WhatsAppError::Api { status, body }) => {
                log::error!("http error sending whatsapp message: {} {}", status, body)
            }
            Err(e) => log::error!("error sending whatsapp message: {}", e),
        }
    }
}
