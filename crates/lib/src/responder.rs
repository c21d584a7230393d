//! Reply generation: one stateless completion call per inbound text, with a fixed fallback on failure.

use crate::llm::{ChatMessage, OpenAiClient, OpenAiError};
use async_trait::async_trait;

/// Reply sent when no completion credential is configured.
pub const NO_CREDENTIAL_REPLY: &str = "Sorry, I can't connect to my brain right now.";
/// Reply sent when the completion call fails for any other reason.
pub const FALLBACK_REPLY: &str = "I encountered an error. Please try again later.";

/// Turns a user message into reply text. Never fails: implementations substitute a fallback.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, message: &str) -> String;
}

/// Generator backed by an OpenAI-compatible provider. No history: system prompt + one user turn.
pub struct CompletionResponder {
    client: OpenAiClient,
    model: String,
    system_prompt: String,
}

impl CompletionResponder {
    pub fn new(client: OpenAiClient, model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let responder = Self {
            client,
            model: model.into(),
            system_prompt: system_prompt.into(),
        };
        if !responder.client.has_api_key() {
            log::warn!("completion api key is not set; every reply will be the fallback");
        }
        responder
    }

    fn messages(&self, message: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(message),
        ]
    }
}

#[async_trait]
impl ResponseGenerator for CompletionResponder {
    async fn generate(&self, message: &str) -> String {
        log::info!("sending to completion provider (model {}): {:?}", self.model, message);
        match self.client.chat(&self.model, self.messages(message)).await {
            Ok(text) => text,
            Err(OpenAiError::MissingApiKey) => {
                log::error!("completion api key is not set");
                NO_CREDENTIAL_REPLY.to_string()
            }
            Err(e) => {
                log::error!("error calling completion api: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
