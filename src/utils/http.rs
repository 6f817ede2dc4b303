// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;

use crate::error::Result;
use crate::models::{SourceConfig, TelegramConfig};

/// Create the client used to fetch the schedule page.
pub fn create_source_client(config: &SourceConfig) -> Result<Client> {
    if !config.verify_tls {
        log::warn!(
            "TLS certificate verification is DISABLED for {}; responses can be spoofed",
            config.url
        );
    }

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(!config.verify_tls)
        .build()?;
    Ok(client)
}

/// Create the client used to talk to the Bot API.
///
/// Always verifies certificates, independent of the source setting.
pub fn create_telegram_client(config: &TelegramConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
