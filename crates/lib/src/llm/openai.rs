//! OpenAI-compatible chat completions client (https://api.openai.com/v1 by default).
//! Non-streaming only; any server exposing `/chat/completions` works.

use crate::clients::{ClientError, ClientHandle};
use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for `/chat/completions`. Holds a handle to the shared completion client, never its own.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    http: ClientHandle,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("completion api key is not set")]
    MissingApiKey,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {status} {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("completion response had no choices")]
    EmptyResponse,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>, http: ClientHandle) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST /chat/completions — returns the assistant content of the first choice.
    pub async fn chat(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String, OpenAiError> {
        let api_key = self.api_key.as_deref().ok_or(OpenAiError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: model.to_string(),
            messages,
        };
        let res = self
            .http
            .client()?
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OpenAiError::Api { status, body });
        }
        let data: ChatResponse = res.json().await?;
        data.into_content()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, OpenAiError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(OpenAiError::EmptyResponse)
    }
}
