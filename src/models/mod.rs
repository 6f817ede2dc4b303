// src/models/mod.rs

//! Domain models for the outage watcher.

mod config;
mod schedule;

// Re-export all public types
pub use config::{
    ArticleSelectors, Config, ParseMode, PollerConfig, RenderConfig, SourceConfig, SourceMode,
    StateConfig, TelegramConfig, TokenStrategy, env,
};
pub use schedule::{ChangeToken, OutageRecord, ScheduleSnapshot};
