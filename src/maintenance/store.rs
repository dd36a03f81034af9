//! Config Store: the single maintenance document plus change notification.

use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::config::PartialMaintenanceConfig;
use crate::db::DbPool;
use crate::{PinpinError, Result};

/// Well-known key of the maintenance document.
pub const MAINTENANCE_KEY: &str = "appConfig/maintenance";

/// What a subscriber receives: the current document (if any) or an error.
pub type StoreEvent = std::result::Result<Option<PartialMaintenanceConfig>, String>;

/// A document store with live change notification.
pub trait ConfigStore: Send + Sync + 'static {
    /// Read the document. `None` when it was never written.
    fn load(&self) -> impl Future<Output = Result<Option<PartialMaintenanceConfig>>> + Send;

    /// Replace the document.
    fn save(&self, doc: &PartialMaintenanceConfig) -> impl Future<Output = Result<()>> + Send;

    /// Open a live subscription. The first event is the current document.
    fn subscribe(&self) -> impl Future<Output = Result<Subscription>> + Send;
}

/// A live subscription to a [`ConfigStore`].
///
/// Delivers the initial snapshot first, then one event per published change.
/// Only the latest change is kept; intermediate ones may be skipped.
pub struct Subscription {
    initial: Option<StoreEvent>,
    rx: watch::Receiver<StoreEvent>,
}

impl Subscription {
    pub fn new(initial: StoreEvent, rx: watch::Receiver<StoreEvent>) -> Self {
        Self {
            initial: Some(initial),
            rx,
        }
    }

    /// Wait for the next event. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}

/// [`ConfigStore`] persisted in the `app_config` table.
///
/// Writes made through this store are published immediately. Writes made
/// by other processes are picked up by [`SqliteConfigStore::refresh`].
pub struct SqliteConfigStore {
    pool: DbPool,
    key: String,
    tx: watch::Sender<StoreEvent>,
    last_published: Mutex<Option<String>>,
}

impl SqliteConfigStore {
    pub fn new(pool: DbPool) -> Self {
        Self::with_key(pool, MAINTENANCE_KEY)
    }

    pub fn with_key(pool: DbPool, key: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(Ok(None));
        Self {
            pool,
            key: key.into(),
            tx,
            last_published: Mutex::new(None),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    async fn load_raw(&self) -> Result<Option<String>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM app_config WHERE key = ?")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(raw)
    }

    fn parse(raw: &str) -> Result<PartialMaintenanceConfig> {
        serde_json::from_str(raw)
            .map_err(|e| PinpinError::Database(format!("malformed config document: {e}")))
    }

    fn remember(&self, raw: Option<String>) -> bool {
        let mut last = self
            .last_published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *last == raw {
            return false;
        }
        *last = raw;
        true
    }

    /// Re-read the document and publish it if it changed since the last
    /// publication. Returns whether subscribers were notified.
    ///
    /// Read errors and malformed documents are logged and not published, so
    /// subscribers keep their last good config.
    pub async fn refresh(&self) -> bool {
        let raw = match self.load_raw().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Config refresh failed");
                return false;
            }
        };

        if !self.remember(raw.clone()) {
            return false;
        }

        match raw.as_deref().map(Self::parse).transpose() {
            Ok(doc) => {
                debug!(key = %self.key, "Config document changed externally");
                self.tx.send_replace(Ok(doc));
                true
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring malformed config document");
                false
            }
        }
    }
}

impl ConfigStore for SqliteConfigStore {
    async fn load(&self) -> Result<Option<PartialMaintenanceConfig>> {
        self.load_raw()
            .await?
            .as_deref()
            .map(Self::parse)
            .transpose()
    }

    async fn save(&self, doc: &PartialMaintenanceConfig) -> Result<()> {
        let raw = serde_json::to_string(doc)
            .map_err(|e| PinpinError::Database(format!("cannot encode config document: {e}")))?;

        sqlx::query(
            "INSERT INTO app_config (key, value, updated_at) VALUES (?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&self.key)
        .bind(&raw)
        .execute(&self.pool)
        .await
        .map_err(|e| PinpinError::Database(e.to_string()))?;

        self.remember(Some(raw));
        self.tx.send_replace(Ok(Some(doc.clone())));
        debug!(key = %self.key, "Config document saved");
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription> {
        // Subscribe before reading so no write can fall between the two.
        let rx = self.tx.subscribe();
        let initial = self.load().await?;
        Ok(Subscription::new(Ok(initial), rx))
    }
}
