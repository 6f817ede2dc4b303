// src/services/notifier.rs

//! Telegram delivery of rendered schedules.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ParseMode, TelegramConfig};
use crate::utils::markup::compose_messages;
use crate::utils::{http, truncate_for_log};

/// Telegram rejects longer message texts.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Delivers one message per detected change.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, table: &str) -> Result<()>;
}

/// Subset of the Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts messages through the Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    parse_mode: ParseMode,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            endpoint: config.send_message_url(),
            chat_id: config.chat_id.clone(),
            parse_mode: config.parse_mode,
            disable_web_page_preview: config.disable_web_page_preview,
        }
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        let client = http::create_telegram_client(config)?;
        Ok(Self::new(client, config))
    }

    async fn send(&self, text: &str) -> Result<()> {
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", self.parse_mode.as_str()),
            (
                "disable_web_page_preview",
                if self.disable_web_page_preview { "true" } else { "false" },
            ),
        ];

        // Strip the URL from transport errors: it carries the bot token.
        let response = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::delivery(None, e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::delivery(Some(status.as_u16()), e.without_url()))?;
        let api: Option<ApiResponse> = serde_json::from_str(&body).ok();

        let accepted = status.is_success() && api.as_ref().is_none_or(|r| r.ok);
        if !accepted {
            let message = api
                .and_then(|r| r.description)
                .unwrap_or_else(|| truncate_for_log(&body, 200));
            return Err(AppError::delivery(Some(status.as_u16()), message));
        }

        log::debug!("Telegram accepted message for chat {}", self.chat_id);
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Sends the table in as many messages as the length limit needs. A failure
    /// part-way fails the whole notification, so the change is resent in full.
    async fn notify(&self, title: &str, table: &str) -> Result<()> {
        let messages = compose_messages(self.parse_mode, title, table, MAX_MESSAGE_CHARS)?;
        if messages.len() > 1 {
            log::info!(
                "Table exceeds {} characters, sending it in {} parts",
                MAX_MESSAGE_CHARS,
                messages.len()
            );
        }
        for text in &messages {
            self.send(text).await?;
        }
        Ok(())
    }
}
