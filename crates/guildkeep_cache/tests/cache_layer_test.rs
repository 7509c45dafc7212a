//! Tests for cache dispatch and expiry.

use async_trait::async_trait;
use guildkeep_cache::CacheLayer;
use guildkeep_error::BackendError;
use guildkeep_failover::{BackendChannel, BackendMode, FailoverController};
use guildkeep_interface::CacheDriver;
use parking_lot::Mutex;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Driver that keeps values in a map, or fails every call.
#[derive(Default)]
struct MapDriver {
    values: Mutex<HashMap<String, JsonValue>>,
    broken: bool,
}

impl MapDriver {
    fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.broken {
            Err(BackendError::connectivity("READONLY replica"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheDriver for MapDriver {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, BackendError> {
        self.check()?;
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: &JsonValue,
        _ttl: Option<Duration>,
    ) -> Result<(), BackendError> {
        self.check()?;
        self.values.lock().insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.check()?;
        self.values.lock().remove(key);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache = CacheLayer::new(Arc::new(FailoverController::new()));

    cache.set("k", json!("v"), Some(Duration::from_secs(1))).await;
    assert_eq!(cache.get("k").await, Some(json!("v")));

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(cache.get("k").await, Some(json!("v")));

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(cache.get("k").await, None);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_entries_without_ttl_persist() {
    let cache = CacheLayer::new(Arc::new(FailoverController::new()));
    cache.set("forever", json!(1), None).await;

    tokio::time::advance(Duration::from_secs(86_400)).await;
    assert_eq!(cache.get("forever").await, Some(json!(1)));
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_removes_only_expired() {
    let cache = CacheLayer::new(Arc::new(FailoverController::new()));
    cache.set("short", json!(1), Some(Duration::from_secs(1))).await;
    cache.set("long", json!(2), Some(Duration::from_secs(60))).await;

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("long").await, Some(json!(2)));
}

#[tokio::test]
async fn test_durable_driver_receives_writes() {
    let driver = Arc::new(MapDriver::default());
    let cache =
        CacheLayer::new(Arc::new(FailoverController::new())).with_durable(driver.clone());

    cache.set("k", json!({"a": 1}), None).await;

    assert!(cache.is_empty());
    assert_eq!(driver.values.lock().get("k"), Some(&json!({"a": 1})));
    assert_eq!(cache.get("k").await, Some(json!({"a": 1})));

    cache.delete("k").await;
    assert!(driver.values.lock().is_empty());
}

#[tokio::test]
async fn test_driver_failure_falls_back_without_flipping() {
    let controller = Arc::new(FailoverController::new());
    let cache = CacheLayer::new(controller.clone()).with_durable(Arc::new(MapDriver::broken()));

    cache.set("k", json!("v"), None).await;

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("k").await, Some(json!("v")));
    assert_eq!(controller.mode(BackendChannel::Cache), BackendMode::Durable);

    cache.delete("k").await;
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_volatile_channel_bypasses_driver() {
    let controller = Arc::new(FailoverController::new());
    let driver = Arc::new(MapDriver::default());
    let cache = CacheLayer::new(controller.clone()).with_durable(driver.clone());

    controller.force_volatile(BackendChannel::Cache, "disconnected");
    cache.set("k", json!("v"), None).await;

    assert!(driver.values.lock().is_empty());
    assert_eq!(cache.get("k").await, Some(json!("v")));
}

#[tokio::test]
async fn test_typed_round_trip() {
    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Prefix {
        prefix: String,
    }

    let cache = CacheLayer::new(Arc::new(FailoverController::new()));
    cache
        .set_as("guild:1", &Prefix { prefix: "?".into() }, None)
        .await
        .unwrap();

    let prefix: Option<Prefix> = cache.get_as("guild:1").await;
    assert_eq!(prefix, Some(Prefix { prefix: "?".into() }));

    let wrong: Option<u32> = cache.get_as("guild:1").await;
    assert_eq!(wrong, None);
}
