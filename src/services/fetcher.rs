// src/services/fetcher.rs

//! Schedule page retrieval.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http;

/// Something that yields the current page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the raw markup.
    async fn fetch(&self) -> Result<String>;

    /// Human-readable location for logs.
    fn location(&self) -> &str;
}

/// Fetches the page over HTTP with a single reused client.
pub struct HttpPageSource {
    client: Client,
    url: String,
}

impl HttpPageSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Build a source with a client configured from `config`.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = http::create_source_client(config)?;
        Ok(Self::new(client, config.url.clone()))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(&self.url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;
        log::debug!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body)
    }

    fn location(&self) -> &str {
        &self.url
    }
}
