//! Local filesystem state store.
//!
//! The token is a single line of text. Writes go to a sibling `.tmp` file that is
//! renamed over the target, so a reader sees either the old or the new token.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ChangeToken;
use crate::storage::StateStore;

/// File-backed token store.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<Option<ChangeToken>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::state_io(&self.path, e)),
        };

        let token = content.trim();
        if token.is_empty() {
            log::warn!("State file {} is empty", self.path.display());
            return Ok(None);
        }
        Ok(Some(ChangeToken::new(token)))
    }

    async fn save(&self, token: &ChangeToken) -> Result<()> {
        let value = token.as_str().trim();
        if value.is_empty() || value.contains('\n') {
            return Err(AppError::validation(format!(
                "refusing to persist malformed token {:?}",
                token.as_str()
            )));
        }

        self.write_atomic(format!("{value}\n").as_bytes())
            .await
            .map_err(|e| AppError::state_io(&self.path, e))?;
        log::debug!("Saved token to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
