// src/pipeline/poller.rs

//! Fetch → extract → fingerprint → compare → notify → persist, on a fixed timer.
//!
//! A cycle either runs to completion or stops at the first failing step. Nothing is
//! sent or persisted after a failure, and the token is only saved once the message
//! was accepted, so an undelivered change is retried on the next cycle.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{ChangeToken, Config, ScheduleSnapshot, TokenStrategy};
use crate::pipeline::fingerprint::fingerprint;
use crate::pipeline::render::TableRenderer;
use crate::services::{
    Extractor, HttpPageSource, Notifier, PageSource, TelegramNotifier, build_extractor,
};
use crate::storage::{LocalStateStore, StateStore};

/// How a successful cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page had no schedule lines; nothing to compare
    NoRecords,
    /// Token matches the last notified one
    Unchanged { token: ChangeToken },
    /// Change delivered and persisted
    Notified { token: ChangeToken, rows: usize },
}

/// What the watcher would send right now, without sending it.
#[derive(Debug, Clone)]
pub struct Preview {
    pub snapshot: ScheduleSnapshot,
    pub token: Option<ChangeToken>,
    pub title: String,
    pub table: String,
}

/// The change-detection loop and its collaborators.
pub struct Poller {
    source: Box<dyn PageSource>,
    extractor: Box<dyn Extractor>,
    renderer: TableRenderer,
    notifier: Box<dyn Notifier>,
    store: Box<dyn StateStore>,
    strategy: TokenStrategy,
    interval: Duration,
    check_on_start: bool,
    /// Last token known to be delivered; fallback when the store cannot be read
    last_token: Option<ChangeToken>,
    /// `last_token` was delivered but not written; memory is ahead of the store
    unsaved: bool,
}

impl Poller {
    pub fn new(
        source: Box<dyn PageSource>,
        extractor: Box<dyn Extractor>,
        renderer: TableRenderer,
        notifier: Box<dyn Notifier>,
        store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            source,
            extractor,
            renderer,
            notifier,
            store,
            strategy: TokenStrategy::default(),
            interval: Duration::from_secs(300),
            check_on_start: true,
            last_token: None,
            unsaved: false,
        }
    }

    /// Wire up HTTP source, extractor, renderer, Telegram notifier and file store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let poller = Self::new(
            Box::new(HttpPageSource::from_config(&config.source)?),
            build_extractor(&config.source)?,
            TableRenderer::from_config(config)?,
            Box::new(TelegramNotifier::from_config(&config.telegram)?),
            Box::new(LocalStateStore::new(&config.state.path)),
        )
        .with_strategy(config.source.change_token)
        .with_interval(Duration::from_secs(config.poller.interval_secs))
        .with_check_on_start(config.poller.check_on_start);
        Ok(poller)
    }

    pub fn with_strategy(mut self, strategy: TokenStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_check_on_start(mut self, check_on_start: bool) -> Self {
        self.check_on_start = check_on_start;
        self
    }

    /// Read the stored token once at startup. A broken store means "no prior state".
    pub async fn prime(&mut self) {
        match self.store.load().await {
            Ok(Some(token)) => {
                log::info!("Last notified token: {}", token);
                self.last_token = Some(token);
            }
            Ok(None) => log::info!("No saved token at {}, first run", self.store.location()),
            Err(e) => {
                log::warn!(
                    "Could not read state from {}: {}. Treating as first run.",
                    self.store.location(),
                    e
                );
            }
        }
    }

    /// Run one full cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        log::debug!("Fetching {}", self.source.location());
        let markup = self.source.fetch().await?;

        let snapshot = self.extractor.extract(&markup)?;
        if snapshot.is_empty() {
            return Ok(CycleOutcome::NoRecords);
        }

        let token = fingerprint(&snapshot, self.strategy)?;
        let previous = self.previous_token().await;
        if previous.as_ref() == Some(&token) {
            if self.unsaved {
                log::info!("Retrying write of delivered token {}", token);
                self.persist(&token).await?;
            }
            return Ok(CycleOutcome::Unchanged { token });
        }

        log::info!(
            "Schedule changed ({} records, token {}), sending update",
            snapshot.len(),
            token
        );
        let table = self.renderer.render(&snapshot);
        let title = self.renderer.title(&snapshot);
        self.notifier.notify(&title, &table).await?;

        // Delivered: this is the current token even if the write below fails.
        self.last_token = Some(token.clone());
        self.persist(&token).await?;

        Ok(CycleOutcome::Notified {
            token,
            rows: snapshot.len(),
        })
    }

    async fn persist(&mut self, token: &ChangeToken) -> Result<()> {
        let saved = self.store.save(token).await;
        self.unsaved = saved.is_err();
        saved
    }

    /// Token of the last delivered change. Prefers the store, unless a delivered token
    /// has not reached it yet or it cannot be read.
    async fn previous_token(&self) -> Option<ChangeToken> {
        if self.unsaved {
            return self.last_token.clone();
        }
        match self.store.load().await {
            Ok(token) => token,
            Err(e) => {
                log::warn!("State read failed ({}), using last known token", e);
                self.last_token.clone()
            }
        }
    }

    /// Run one cycle and log its result. Never fails.
    pub async fn tick(&mut self) -> Option<CycleOutcome> {
        match self.run_cycle().await {
            Ok(outcome) => {
                match &outcome {
                    CycleOutcome::NoRecords => log::info!(
                        "No schedule lines found on {}, skipping",
                        self.source.location()
                    ),
                    CycleOutcome::Unchanged { .. } => log::info!("No changes"),
                    CycleOutcome::Notified { rows, .. } => {
                        log::info!("Update sent ({} rows) and saved", rows)
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                log_cycle_error(&e, self.source.location());
                None
            }
        }
    }

    /// Fetch, extract and render without notifying or persisting.
    pub async fn preview(&self) -> Result<Preview> {
        let markup = self.source.fetch().await?;
        let snapshot = self.extractor.extract(&markup)?;
        let token = if snapshot.is_empty() {
            None
        } else {
            Some(fingerprint(&snapshot, self.strategy)?)
        };
        Ok(Preview {
            title: self.renderer.title(&snapshot),
            table: self.renderer.render(&snapshot),
            token,
            snapshot,
        })
    }

    /// Stored token as the store sees it.
    pub async fn stored_token(&self) -> Result<Option<ChangeToken>> {
        self.store.load().await
    }

    /// Loop until `shutdown` resolves.
    ///
    /// Shutdown is only observed while sleeping, so a cycle in progress (and its
    /// state write) always completes.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.prime().await;
        log::info!(
            "Watching {} every {}s",
            self.source.location(),
            self.interval.as_secs()
        );

        let mut skip_wait = self.check_on_start;
        loop {
            if !skip_wait {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            skip_wait = false;
            self.tick().await;
        }

        log::info!("Shutdown requested, poller stopped");
    }
}

fn log_cycle_error(error: &AppError, location: &str) {
    match error {
        AppError::Fetch { url, message } => {
            log::warn!("Fetch failed for {}: {}. Retrying next cycle.", url, message)
        }
        AppError::NotFound(message) => log::warn!(
            "Page structure not recognised at {}: {}. Retrying next cycle.",
            location,
            message
        ),
        AppError::Delivery { .. } => {
            log::error!("{}. Token not saved, will resend on next change check.", error)
        }
        AppError::StateIo { .. } => {
            log::error!(
                "{}. Notification was sent, keeping the token in memory and retrying the write.",
                error
            )
        }
        other => log::error!("Cycle failed [{}]: {}", other.kind(), other),
    }
}
