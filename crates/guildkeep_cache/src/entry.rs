//! In-process cache entries.

use derive_getters::Getters;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with value and optional expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    value: JsonValue,
    created_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    pub(crate) fn new(value: JsonValue, ttl: Option<Duration>) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry is expired. Entries without a TTL never expire.
    pub fn is_expired(&self) -> bool {
        self.ttl
            .is_some_and(|ttl| self.created_at.elapsed() >= ttl)
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl?.checked_sub(self.created_at.elapsed())
    }
}
