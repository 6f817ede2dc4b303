//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::parse_selector;

/// Environment variables that override file settings.
pub mod env {
    pub const URL: &str = "OUTAGE_WATCH_URL";
    pub const INTERVAL_SECS: &str = "OUTAGE_WATCH_INTERVAL_SECS";
    pub const BOT_TOKEN: &str = "OUTAGE_WATCH_BOT_TOKEN";
    pub const CHAT_ID: &str = "OUTAGE_WATCH_CHAT_ID";
    pub const STATE_FILE: &str = "OUTAGE_WATCH_STATE_FILE";
    pub const VERIFY_TLS: &str = "OUTAGE_WATCH_VERIFY_TLS";
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where and how to read the schedule page
    #[serde(default)]
    pub source: SourceConfig,

    /// Timer settings
    #[serde(default)]
    pub poller: PollerConfig,

    /// Messaging endpoint
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Persisted change token
    #[serde(default)]
    pub state: StateConfig,

    /// Table and message text
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `path`, or defaults when no file exists there.
    ///
    /// A file that exists but does not parse is an error, never replaced by defaults.
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply overrides from environment-style lookups.
    ///
    /// Takes a lookup function so tests can supply a fake environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env::URL) {
            self.source.url = url;
        }
        if let Some(secs) = lookup(env::INTERVAL_SECS) {
            self.poller.interval_secs = secs.trim().parse().map_err(|_| {
                AppError::config(format!(
                    "{} must be an integer, got '{}'",
                    env::INTERVAL_SECS,
                    secs
                ))
            })?;
        }
        if let Some(token) = lookup(env::BOT_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup(env::CHAT_ID) {
            self.telegram.chat_id = chat_id;
        }
        if let Some(path) = lookup(env::STATE_FILE) {
            self.state.path = PathBuf::from(path);
        }
        if let Some(flag) = lookup(env::VERIFY_TLS) {
            self.source.verify_tls = parse_bool(&flag).ok_or_else(|| {
                AppError::config(format!(
                    "{} must be true or false, got '{}'",
                    env::VERIFY_TLS,
                    flag
                ))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation(format!(
                "source.url is empty (set it in the config file or {})",
                env::URL
            )));
        }
        let url = Url::parse(&self.source.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::validation("source.url must be http or https"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.always_on_marker.trim().is_empty() {
            return Err(AppError::validation("source.always_on_marker is empty"));
        }
        if self.source.change_token == TokenStrategy::ArticleId
            && self.source.mode != SourceMode::Article
        {
            return Err(AppError::validation(
                "source.change_token = \"article_id\" requires source.mode = \"article\"",
            ));
        }
        match self.source.mode {
            SourceMode::PageText => {
                parse_selector(&self.source.content_selector)?;
            }
            SourceMode::Article => {
                let article = &self.source.article;
                parse_selector(&article.article_selector)?;
                parse_selector(&article.heading_selector)?;
                parse_selector(&article.content_selector)?;
                if article.id_attr.trim().is_empty() {
                    return Err(AppError::validation("source.article.id_attr is empty"));
                }
            }
        }
        if self.poller.interval_secs == 0 {
            return Err(AppError::validation("poller.interval_secs must be > 0"));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::validation(format!(
                "telegram.bot_token is empty (set {})",
                env::BOT_TOKEN
            )));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(AppError::validation(format!(
                "telegram.chat_id is empty (set {})",
                env::CHAT_ID
            )));
        }
        Url::parse(&self.telegram.api_base)?;
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.state.path.as_os_str().is_empty() {
            return Err(AppError::validation("state.path is empty"));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// How records are located on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Scan all text inside `content_selector`
    #[default]
    PageText,
    /// Read the first matching article block
    Article,
}

/// What the change token is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStrategy {
    /// SHA-256 over the extracted records; any text edit triggers a notification
    #[default]
    ContentHash,
    /// The article identifier; only a new post triggers a notification
    ArticleId,
}

/// Schedule page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page URL. No default, must be supplied.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub mode: SourceMode,

    #[serde(default)]
    pub change_token: TokenStrategy,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Verify the page's TLS certificate
    #[serde(default = "defaults::verify_tls")]
    pub verify_tls: bool,

    /// Container scanned in page-text mode
    #[serde(default = "defaults::content_selector")]
    pub content_selector: String,

    /// Phrase marking a line that is never switched off
    #[serde(default = "defaults::always_on_marker")]
    pub always_on_marker: String,

    #[serde(default)]
    pub article: ArticleSelectors,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            mode: SourceMode::default(),
            change_token: TokenStrategy::default(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            verify_tls: defaults::verify_tls(),
            content_selector: defaults::content_selector(),
            always_on_marker: defaults::always_on_marker(),
            article: ArticleSelectors::default(),
        }
    }
}

/// Selectors for article mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSelectors {
    /// The article element; the first match is used
    #[serde(default = "defaults::article_selector")]
    pub article_selector: String,

    /// Attribute holding the article identifier
    #[serde(default = "defaults::id_attr")]
    pub id_attr: String,

    /// Heading inside the article
    #[serde(default = "defaults::heading_selector")]
    pub heading_selector: String,

    /// Content container inside the article
    #[serde(default = "defaults::article_content_selector")]
    pub content_selector: String,
}

impl Default for ArticleSelectors {
    fn default() -> Self {
        Self {
            article_selector: defaults::article_selector(),
            id_attr: defaults::id_attr(),
            heading_selector: defaults::heading_selector(),
            content_selector: defaults::article_content_selector(),
        }
    }
}

/// Timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Fixed delay between cycles in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Run a cycle immediately on startup instead of waiting one interval
    #[serde(default = "defaults::check_on_start")]
    pub check_on_start: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            check_on_start: defaults::check_on_start(),
        }
    }
}

/// Telegram markup dialect for outgoing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    /// Value sent as the `parse_mode` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::MarkdownV2 => "MarkdownV2",
            ParseMode::Html => "HTML",
        }
    }
}

/// Telegram Bot API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token. No default, must be supplied.
    #[serde(default)]
    pub bot_token: String,

    /// Destination chat or channel. No default, must be supplied.
    #[serde(default)]
    pub chat_id: String,

    #[serde(default)]
    pub parse_mode: ParseMode,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    #[serde(default = "defaults::disable_web_page_preview")]
    pub disable_web_page_preview: bool,
}

impl TelegramConfig {
    /// Full `sendMessage` endpoint for the configured bot.
    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: String::new(),
            chat_id: String::new(),
            parse_mode: ParseMode::default(),
            timeout_secs: defaults::timeout(),
            disable_web_page_preview: defaults::disable_web_page_preview(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.bot_token.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &token)
            .field("chat_id", &self.chat_id)
            .field("parse_mode", &self.parse_mode)
            .field("timeout_secs", &self.timeout_secs)
            .field("disable_web_page_preview", &self.disable_web_page_preview)
            .finish()
    }
}

/// Persisted state location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "defaults::state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: defaults::state_path(),
        }
    }
}

/// Message text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Message title placed above the table
    #[serde(default = "defaults::title")]
    pub title: String,

    #[serde(default = "defaults::line_header")]
    pub line_header: String,

    #[serde(default = "defaults::from_header")]
    pub from_header: String,

    #[serde(default = "defaults::to_header")]
    pub to_header: String,

    /// Append the local check time below the title
    #[serde(default)]
    pub show_checked_at: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            line_header: defaults::line_header(),
            from_header: defaults::from_header(),
            to_header: defaults::to_header(),
            show_checked_at: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; outage-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn verify_tls() -> bool {
        true
    }
    pub fn content_selector() -> String {
        "body".into()
    }
    pub fn always_on_marker() -> String {
        "не вимикається".into()
    }

    // Article defaults
    pub fn article_selector() -> String {
        "article".into()
    }
    pub fn id_attr() -> String {
        "id".into()
    }
    pub fn heading_selector() -> String {
        "h1, h2, .entry-title".into()
    }
    pub fn article_content_selector() -> String {
        ".entry-content".into()
    }

    // Poller defaults
    pub fn interval() -> u64 {
        300
    }
    pub fn check_on_start() -> bool {
        true
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn disable_web_page_preview() -> bool {
        true
    }

    // State defaults
    pub fn state_path() -> PathBuf {
        PathBuf::from("state/last_token")
    }

    // Render defaults
    pub fn title() -> String {
        "⚡ Нове оновлення розкладу:".into()
    }
    pub fn line_header() -> String {
        "Лінія".into()
    }
    pub fn from_header() -> String {
        "З".into()
    }
    pub fn to_header() -> String {
        "До".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.source.url = "https://example.com/outages".to_string();
        config.telegram.bot_token = "123:abc".to_string();
        config.telegram.chat_id = "-100123".to_string();
        config
    }

    #[test]
    fn test_load_if_present_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_if_present(tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.poller.interval_secs, 300);
        assert_eq!(config.state.path, PathBuf::from("state/last_token"));
    }

    #[test]
    fn test_load_if_present_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[state]\npath = \"/var/lib/ow/token\"\n[telegram]\nparse_mode = \"HTML\"\n",
        )
        .unwrap();

        let config = Config::load_if_present(&path).unwrap();
        assert_eq!(config.state.path, PathBuf::from("/var/lib/ow/token"));
        assert_eq!(config.telegram.parse_mode, ParseMode::Html);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[state]\npath = \"/var/lib/ow/token\"\n[poller]\ninterval_secs = \"60\"\n",
        )
        .unwrap();

        assert!(matches!(Config::load_if_present(&path), Err(AppError::Toml(_))));
    }

    fn fake_env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_default_config_requires_secrets() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_chat_id() {
        let mut config = valid_config();
        config.telegram.chat_id = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = valid_config();
        config.poller.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_article_id_in_page_mode() {
        let mut config = valid_config();
        config.source.change_token = TokenStrategy::ArticleId;
        assert!(config.validate().is_err());

        config.source.mode = SourceMode::Article;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = valid_config();
        config.source.content_selector = "[[broken".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn verify_tls_defaults_on() {
        assert!(Config::default().source.verify_tls);
    }

    #[test]
    fn apply_env_overrides_fields() {
        let mut config = Config::default();
        let lookup = fake_env(&[
            (env::URL, "https://example.com/page"),
            (env::INTERVAL_SECS, "60"),
            (env::BOT_TOKEN, "1:xyz"),
            (env::CHAT_ID, "@channel"),
            (env::STATE_FILE, "/tmp/token"),
            (env::VERIFY_TLS, "false"),
        ]);
        config.apply_env(lookup).unwrap();

        assert_eq!(config.source.url, "https://example.com/page");
        assert_eq!(config.poller.interval_secs, 60);
        assert_eq!(config.telegram.bot_token, "1:xyz");
        assert_eq!(config.telegram.chat_id, "@channel");
        assert_eq!(config.state.path, PathBuf::from("/tmp/token"));
        assert!(!config.source.verify_tls);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn apply_env_rejects_bad_interval() {
        let mut config = Config::default();
        let result = config.apply_env(fake_env(&[(env::INTERVAL_SECS, "five")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn parse_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            url = "https://example.com"
            mode = "article"
            change_token = "article_id"

            [telegram]
            chat_id = "42"
            parse_mode = "HTML"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.mode, SourceMode::Article);
        assert_eq!(config.source.change_token, TokenStrategy::ArticleId);
        assert_eq!(config.telegram.parse_mode, ParseMode::Html);
        assert_eq!(config.poller.interval_secs, 300);
        assert_eq!(config.source.article.id_attr, "id");
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn debug_redacts_bot_token() {
        let config = valid_config();
        let printed = format!("{:?}", config.telegram);
        assert!(!printed.contains("123:abc"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn send_message_url_trims_slash() {
        let mut telegram = TelegramConfig::default();
        telegram.api_base = "https://api.telegram.org/".to_string();
        telegram.bot_token = "1:abc".to_string();
        assert_eq!(
            telegram.send_message_url(),
            "https://api.telegram.org/bot1:abc/sendMessage"
        );
    }
}
