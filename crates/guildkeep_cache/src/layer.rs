//! Cache façade with per-call dispatch.

use crate::CacheEntry;
use guildkeep_failover::{BackendChannel, FailoverController};
use guildkeep_interface::CacheDriver;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Key-value cache routed between a durable driver and process memory.
///
/// # Example
///
/// ```
/// use guildkeep_cache::CacheLayer;
/// use guildkeep_failover::FailoverController;
/// use serde_json::json;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let cache = CacheLayer::new(Arc::new(FailoverController::new()));
///
/// cache.set("guild:1:prefix", json!("!"), Some(Duration::from_secs(60))).await;
/// assert_eq!(cache.get("guild:1:prefix").await, Some(json!("!")));
///
/// cache.delete("guild:1:prefix").await;
/// assert_eq!(cache.get("guild:1:prefix").await, None);
/// # });
/// ```
pub struct CacheLayer {
    controller: Arc<FailoverController>,
    durable: Option<Arc<dyn CacheDriver>>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("durable", &self.durable.is_some())
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl CacheLayer {
    /// Cache served from memory only.
    pub fn new(controller: Arc<FailoverController>) -> Self {
        Self {
            controller,
            durable: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Delegate to `durable` while the cache channel is durable.
    pub fn with_durable(mut self, durable: Arc<dyn CacheDriver>) -> Self {
        self.durable = Some(durable);
        self
    }

    fn durable(&self) -> Option<&Arc<dyn CacheDriver>> {
        self.durable
            .as_ref()
            .filter(|_| self.controller.is_durable(BackendChannel::Cache))
    }

    /// Store `value` under `key`, expiring after `ttl` when given.
    #[instrument(skip(self, value), fields(key, ttl = ?ttl))]
    pub async fn set(&self, key: &str, value: JsonValue, ttl: Option<Duration>) {
        if let Some(driver) = self.durable() {
            match driver.set(key, &value, ttl).await {
                Ok(()) => return,
                Err(err) => warn!(error = %err, "Durable cache write failed, keeping entry in memory"),
            }
        }
        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        debug!("Inserted entry into memory cache");
    }

    /// Read `key`. Expired entries are absent and evicted on read.
    #[instrument(skip(self), fields(key))]
    pub async fn get(&self, key: &str) -> Option<JsonValue> {
        if let Some(driver) = self.durable() {
            match driver.get(key).await {
                Ok(value) => return value,
                Err(err) => warn!(error = %err, "Durable cache read failed, reading memory"),
            }
        }
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            debug!("Cache entry expired, removing");
            entries.remove(key);
            return None;
        }
        debug!(time_remaining = ?entry.time_remaining(), "Cache hit");
        Some(entry.value().clone())
    }

    /// Remove `key` from the durable cache (when active) and from memory.
    #[instrument(skip(self), fields(key))]
    pub async fn delete(&self, key: &str) {
        if let Some(driver) = self.durable()
            && let Err(err) = driver.delete(key).await
        {
            warn!(error = %err, "Durable cache delete failed");
        }
        self.entries.lock().remove(key);
    }

    /// Serialize `value` and store it.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub async fn set_as<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl).await;
        Ok(())
    }

    /// Read `key` and deserialize it. Values of the wrong shape are absent.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                debug!(key, error = %err, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Remove expired in-memory entries, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, remaining = entries.len(), "Cleaned up expired cache entries");
        }
        removed
    }

    /// Number of in-memory entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the in-memory map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every in-memory entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        info!(cleared = count, "Cleared memory cache");
    }
}
