//! Chat notifications
//!
//! Delivery is best effort: a message that fails to send is logged and
//! dropped, and the failure never reaches the poll loop.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::TelegramConfig;
use crate::error::NotifyError;

/// Delivers a text message to a chat
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API sink
pub struct TelegramSink {
    base_url: String,
    token: String,
    http: Client,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig, token: impl Into<String>) -> Result<Self, NotifyError> {
        debug!(base_url = %config.base_url, "TelegramSink::new: called");
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.token)
    }

    fn build_request_body(chat_id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        debug!(%chat_id, len = text.len(), "send: called");

        let response = self
            .http
            .post(self.send_message_url())
            .json(&Self::build_request_body(chat_id, text))
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::ApiError { status, message });
        }

        let reply: TelegramReply = response.json().await?;
        if !reply.ok {
            return Err(NotifyError::Rejected(
                reply.description.unwrap_or_else(|| "no description".to_string()),
            ));
        }

        Ok(())
    }
}

/// Sends messages to the one configured chat
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    chat_id: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>, chat_id: impl Into<String>) -> Self {
        Self {
            sink,
            chat_id: chat_id.into(),
        }
    }

    /// Send a message, returning whether it was delivered
    pub async fn notify(&self, message: &str) -> bool {
        match self.sink.send(&self.chat_id, message).await {
            Ok(()) => {
                info!(chat_id = %self.chat_id, "Message sent");
                true
            }
            Err(e) => {
                error!(chat_id = %self.chat_id, error = %e, "Failed to send message");
                false
            }
        }
    }
}
