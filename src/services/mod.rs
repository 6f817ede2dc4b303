//! Service layer for the outage watcher.
//!
//! This module contains the collaborators the poller drives:
//! - Page retrieval (`PageSource`, `HttpPageSource`)
//! - Record extraction (`Extractor`, `PageTextExtractor`, `ArticleExtractor`)
//! - Message delivery (`Notifier`, `TelegramNotifier`)

mod extractor;
mod fetcher;
mod notifier;

#[cfg(test)]
pub(crate) mod test_server;

pub use extractor::{
    ArticleExtractor, Extractor, PageTextExtractor, RecordGrammar, build_extractor,
};
pub use fetcher::{HttpPageSource, PageSource};
pub use notifier::{Notifier, TelegramNotifier};
