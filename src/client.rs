use log::{debug, error};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ChatError, ChatResult};
use crate::models::{HealthStatus, Message, NewMessage, DEFAULT_SENDER};

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

const FETCH_FAILED: &str = "Failed to fetch messages";
const SEND_FAILED: &str = "Failed to send message";
const HEALTH_FAILED: &str = "Failed to check server health";

/// Accepted shapes of a send response. A lone message object is tolerated
/// and normalized; anything else is rejected.
#[derive(Deserialize)]
#[serde(untagged)]
enum SendResponse {
    Batch(Vec<Message>),
    Single(Message),
}

impl From<SendResponse> for Vec<Message> {
    fn from(response: SendResponse) -> Self {
        match response {
            SendResponse::Batch(messages) => messages,
            SendResponse::Single(message) => vec![message],
        }
    }
}

/// Typed wrapper around the chat HTTP API. Never retries; every failure is
/// handed back to the caller.
#[derive(Debug, Clone)]
pub struct ChatApi {
    http: Client,
    base_url: String,
}

impl ChatApi {
    pub fn new(base_url: &str) -> Self {
        ChatApi {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> ChatResult<HealthStatus> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| network(HEALTH_FAILED, e))?;
        decode(HEALTH_FAILED, response).await
    }

    pub async fn get_messages(&self) -> ChatResult<Vec<Message>> {
        let response = self
            .http
            .get(self.url("/chat/messages"))
            .send()
            .await
            .map_err(|e| network(FETCH_FAILED, e))?;
        let messages: Vec<Message> = decode(FETCH_FAILED, response).await?;
        debug!("Fetched {} messages", messages.len());
        Ok(messages)
    }

    /// Post `text`; `None` sends the default "Anonymous" sender.
    pub async fn send_message(&self, text: &str, sender: Option<&str>) -> ChatResult<Vec<Message>> {
        let body = NewMessage::new(text, sender.unwrap_or(DEFAULT_SENDER));
        let response = self
            .http
            .post(self.url("/chat/messages"))
            .json(&body)
            .send()
            .await
            .map_err(|e| network(SEND_FAILED, e))?;
        let sent: SendResponse = decode(SEND_FAILED, response).await?;
        Ok(sent.into())
    }
}

impl Default for ChatApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn network(action: &'static str, e: reqwest::Error) -> ChatError {
    error!("{}: {}", action, e);
    ChatError::Network {
        action,
        detail: e.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(action: &'static str, response: Response) -> ChatResult<T> {
    let status = response.status();
    if !status.is_success() {
        error!("{}: server responded with {}", action, status);
        return Err(ChatError::Network {
            action,
            detail: format!("server responded with {}", status),
        });
    }

    let body = response.bytes().await.map_err(|e| network(action, e))?;
    serde_json::from_slice(&body).map_err(|e| {
        error!("{}: response did not match the expected schema: {}", action, e);
        ChatError::UnexpectedResponse {
            action,
            detail: e.to_string(),
        }
    })
}
