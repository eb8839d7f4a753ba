use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::contracts::ChatMessage;

/// The one reply status the chat webhook uses for an accepted message.
pub const DELIVERED_STATUS: StatusCode = StatusCode::NO_CONTENT;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("chat webhook URL is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("delivery timed out")]
    TimedOut,
    #[error("chat webhook replied {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::TimedOut
        } else {
            DispatchError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn deliver(&self, message: &ChatMessage) -> Result<(), DispatchError>;
}

#[derive(Clone)]
pub struct DiscordWebhook {
    http: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChatSink for DiscordWebhook {
    async fn deliver(&self, message: &ChatMessage) -> Result<(), DispatchError> {
        let response = self.http.post(&self.url).json(message).send().await?;

        let status = response.status();
        if status == DELIVERED_STATUS {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}
