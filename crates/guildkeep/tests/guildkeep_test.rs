//! Bootstrap, configuration and dispatch tests for the facade.

use async_trait::async_trait;
use guildkeep::{
    BackendChannel, BackendError, BackendMode, CommandContext, CommandHandler, CommandResponse,
    ConnectivityEvent, Dispatch, DurableConnection, Guildkeep, GuildkeepConfig, GuildkeepErrorKind,
    GuildkeepResult, LimiterConfig, NewCustomCommandBuilder, NewGuild, VolatileStore,
};
use serde_json::{Value as JsonValue, json};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

struct TestConnection {
    events: broadcast::Sender<ConnectivityEvent>,
    reachable: bool,
    calls: AtomicUsize,
}

impl TestConnection {
    fn new(reachable: bool) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            events,
            reachable,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DurableConnection for TestConnection {
    async fn connect(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok(())
        } else {
            Err(BackendError::connectivity("connection refused"))
        }
    }

    fn events(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }
}

struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Replies with pong"
    }

    fn cooldown(&self) -> Option<Duration> {
        Some(Duration::from_secs(5))
    }

    async fn execute(&self, context: &CommandContext) -> GuildkeepResult<JsonValue> {
        Ok(json!({ "reply": "pong", "user": context.user_id() }))
    }
}

fn configured(entity_url: &str) -> GuildkeepConfig {
    let mut config = GuildkeepConfig::from_toml("").unwrap();
    config.database.entity_url = Some(entity_url.to_string());
    config.database.connect_attempts = 1;
    config
}

#[test]
fn test_config_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[database]
entity_url = "mongodb://db.internal:27017/guildkeep"

[rate_limit.command]
max_requests = 2
window_ms = 1000

[observability]
json_logs = true
"#
    )
    .unwrap();

    let config = GuildkeepConfig::from_file(file.path()).unwrap();
    assert_eq!(config.rate_limit.command, LimiterConfig::new(2, Duration::from_secs(1)));
    assert_eq!(config.rate_limit.global, LimiterConfig::global());
    assert!(config.observability.json_logs);
    assert_eq!(
        config.database.usable_url(BackendChannel::Entity),
        Some("mongodb://db.internal:27017/guildkeep")
    );
    // Bundled placeholders survive the override.
    assert!(config.database.usable_url(BackendChannel::Cache).is_none());
    assert_eq!(config.database.placeholder_urls.len(), 2);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[rate_limit.strict]\nmax_requests = 0\nwindow_ms = 1000").unwrap();
    let err = GuildkeepConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("rate_limit.strict.max_requests"));
    match err.kind() {
        GuildkeepErrorKind::Config(config) => {
            assert_eq!(config.key(), Some("rate_limit.strict.max_requests"));
        }
        other => panic!("expected a configuration error, got {}", other),
    }

    assert!(GuildkeepConfig::from_file("/nonexistent/guildkeep.toml").is_err());
}

#[tokio::test]
async fn test_unconfigured_start_is_volatile() {
    let guildkeep = Guildkeep::builder(GuildkeepConfig::default())
        .start()
        .await
        .unwrap();

    let health = guildkeep.health();
    assert_eq!(health.failover.entity.mode, BackendMode::Volatile);
    assert_eq!(health.failover.cache.mode, BackendMode::Volatile);
    assert!(health.volatile.active);

    guildkeep
        .store()
        .create_guild(NewGuild::new("g1", "Guild One", "owner"))
        .await
        .unwrap();
    assert_eq!(guildkeep.health().volatile.guilds, 1);
    guildkeep.shutdown();
}

#[tokio::test]
async fn test_placeholder_url_skips_connection() {
    let connection = TestConnection::new(true);
    let durable = Arc::new(VolatileStore::new());
    let guildkeep = Guildkeep::builder(configured(
        "mongodb://localhost:27017/discord-bot-dashboard",
    ))
    .entity_driver(durable, connection.clone())
    .start()
    .await
    .unwrap();

    assert_eq!(connection.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        guildkeep.controller().mode(BackendChannel::Entity),
        BackendMode::Volatile
    );
    guildkeep.shutdown();
}

#[tokio::test]
async fn test_durable_driver_serves_and_recovers() {
    let connection = TestConnection::new(true);
    let durable = Arc::new(VolatileStore::new());
    let guildkeep = Guildkeep::builder(configured("mongodb://db.internal:27017/guildkeep"))
        .entity_driver(durable.clone(), connection.clone())
        .start()
        .await
        .unwrap();

    assert_eq!(connection.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        guildkeep.controller().mode(BackendChannel::Entity),
        BackendMode::Durable
    );

    let store = guildkeep.store();
    store
        .create_guild(NewGuild::new("g1", "Guild One", "owner"))
        .await
        .unwrap();
    assert!(durable.find_guild("g1").is_some());
    assert!(store.volatile().find_guild("g1").is_none());

    connection.events.send(ConnectivityEvent::Disconnected).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while guildkeep.controller().is_durable(BackendChannel::Entity) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    store
        .create_guild(NewGuild::new("g2", "Guild Two", "owner"))
        .await
        .unwrap();
    assert!(durable.find_guild("g2").is_none());
    assert_eq!(guildkeep.health().failover.entity.transitions, 1);
    guildkeep.shutdown();
}

#[tokio::test]
async fn test_unreachable_driver_starts_volatile() {
    let connection = TestConnection::new(false);
    let guildkeep = Guildkeep::builder(configured("mongodb://db.internal:27017/guildkeep"))
        .entity_driver(Arc::new(VolatileStore::new()), connection.clone())
        .start()
        .await
        .unwrap();

    assert_eq!(connection.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        guildkeep.controller().mode(BackendChannel::Entity),
        BackendMode::Volatile
    );
    guildkeep.shutdown();
}

#[tokio::test]
async fn test_dispatch_enforces_cooldown_and_counts_custom_use() {
    let guildkeep = Guildkeep::builder(GuildkeepConfig::default())
        .command(Arc::new(Ping))
        .start()
        .await
        .unwrap();
    assert_eq!(guildkeep.registry().list()[0].name(), "ping");

    let context = guildkeep.context("g1", "u1", Vec::new());
    let first = guildkeep.dispatch(&context, "ping").await.unwrap();
    assert_eq!(first, Dispatch::Executed(json!({ "reply": "pong", "user": "u1" })));
    assert!(matches!(
        guildkeep.dispatch(&context, "ping").await.unwrap(),
        Dispatch::Cooldown(wait) if wait > Duration::ZERO
    ));

    guildkeep
        .store()
        .create_custom_command(
            NewCustomCommandBuilder::default()
                .guild_id("g1")
                .name("rules")
                .trigger("Rules")
                .response(CommandResponse::text("Be kind"))
                .created_by("admin")
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

    let Dispatch::Custom(record) = guildkeep.dispatch(&context, "rules").await.unwrap() else {
        panic!("custom command should match");
    };
    assert_eq!(record.uses, 1);
    assert_eq!(guildkeep.dispatch(&context, "nope").await.unwrap(), Dispatch::Unknown);
    guildkeep.shutdown();
}

#[tokio::test]
async fn test_dispatch_applies_command_rate_limit() {
    let mut config = GuildkeepConfig::default();
    config.rate_limit.command = LimiterConfig::new(2, Duration::from_secs(10));
    let guildkeep = Guildkeep::builder(config).start().await.unwrap();
    let context = guildkeep.context("g1", "u1", Vec::new());

    for _ in 0..2 {
        assert_eq!(guildkeep.dispatch(&context, "nope").await.unwrap(), Dispatch::Unknown);
    }
    assert!(matches!(
        guildkeep.dispatch(&context, "nope").await.unwrap(),
        Dispatch::RateLimited { reset_at: Some(_) }
    ));
    guildkeep.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_maintenance_drops_expired_cache_entries() {
    let guildkeep = Guildkeep::builder(GuildkeepConfig::default())
        .start()
        .await
        .unwrap();
    let cache = guildkeep.cache();
    cache.set("short", json!("v"), Some(Duration::from_secs(1))).await;
    cache.set("forever", json!("v"), None).await;
    assert_eq!(cache.len(), 2);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(cache.len(), 1);
    guildkeep.shutdown();
}
