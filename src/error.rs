// src/error.rs

//! Unified error handling for the outage watcher.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// `Fetch`, `NotFound`, `Delivery` and `StateIo` are cycle-level failures: the poller
/// logs them and waits for the next tick. The rest surface during startup.
#[derive(Error, Debug)]
pub enum AppError {
    /// Source page could not be retrieved (transport, timeout or non-2xx)
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Expected markup structure is missing from the page
    #[error("Content not found: {0}")]
    NotFound(String),

    /// Notification was not accepted by the messaging endpoint
    #[error("Delivery failed{}: {message}", status_suffix(.status))]
    Delivery {
        status: Option<u16>,
        message: String,
    },

    /// Persisted state could not be read or written
    #[error("State I/O error at {path}: {source}")]
    StateIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error outside of a fetch or delivery
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl AppError {
    /// Create a fetch error for the given URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a delivery error.
    pub fn delivery(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            status,
            message: message.to_string(),
        }
    }

    /// Create a state I/O error for the given path.
    pub fn state_io(path: &Path, source: std::io::Error) -> Self {
        Self::StateIo {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short label used as log context.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::NotFound(_) => "not-found",
            Self::Delivery { .. } => "delivery",
            Self::StateIo { .. } => "state-io",
            Self::Io(_) => "io",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Toml(_) => "toml",
            Self::Url(_) => "url",
            Self::Regex(_) => "regex",
            Self::Selector { .. } => "selector",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
        }
    }
}
