//! Persistence of the last notified change token.
//!
//! The watcher keeps exactly one durable value: the token of the last snapshot that
//! was delivered successfully. Absence means "never notified".

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ChangeToken;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for change-token storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the stored token, `None` on first run.
    async fn load(&self) -> Result<Option<ChangeToken>>;

    /// Replace the stored token.
    async fn save(&self, token: &ChangeToken) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
