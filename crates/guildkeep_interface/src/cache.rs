//! Durable key-value cache contract.

use async_trait::async_trait;
use guildkeep_error::BackendError;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Key-value cache with optional per-entry expiry.
#[async_trait]
pub trait CacheDriver: Send + Sync {
    /// Read `key`; expired or missing entries are `None`.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, BackendError>;

    /// Write `key`, expiring after `ttl` when given.
    async fn set(
        &self,
        key: &str,
        value: &JsonValue,
        ttl: Option<Duration>,
    ) -> Result<(), BackendError>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;
}
