//! Service bootstrap and lifetime.

use crate::{CommandContext, CommandHandler, CommandRegistry, Dispatch, GuildkeepConfig};
use chrono::Utc;
use guildkeep_cache::CacheLayer;
use guildkeep_core::retention_cutoff;
use guildkeep_database::{StoreAdapter, VolatileStats, VolatileStore};
use guildkeep_error::GuildkeepResult;
use guildkeep_failover::{
    BackendChannel, FailoverController, FailoverObserver, FailoverSnapshot, TracingObserver,
};
use guildkeep_interface::{CacheDriver, DurableConnection, EntityRepository};
use guildkeep_rate_limit::RateGovernor;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// A durable driver together with its connection handle.
struct Durable<T: ?Sized> {
    driver: Arc<T>,
    connection: Arc<dyn DurableConnection>,
}

/// Point-in-time view of the running services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Mode and transition counts per channel
    pub failover: FailoverSnapshot,
    /// Records held in memory
    pub volatile: VolatileStats,
    /// Entries in the in-process cache map
    pub cache_entries: usize,
    /// Registered built-in commands
    pub commands: usize,
}

/// Assembles a [`Guildkeep`] instance.
///
/// # Example
///
/// ```
/// use guildkeep::{Guildkeep, GuildkeepConfig};
/// use guildkeep_failover::{BackendChannel, BackendMode};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let guildkeep = Guildkeep::builder(GuildkeepConfig::default()).start().await.unwrap();
/// let health = guildkeep.health();
/// assert_eq!(health.failover.entity.mode, BackendMode::Volatile);
/// guildkeep.shutdown();
/// # });
/// ```
pub struct GuildkeepBuilder {
    config: GuildkeepConfig,
    entity: Option<Durable<dyn EntityRepository>>,
    cache: Option<Durable<dyn CacheDriver>>,
    observers: Vec<Arc<dyn FailoverObserver>>,
    registry: CommandRegistry,
}

impl GuildkeepBuilder {
    /// Durable entity store driver and its connection.
    pub fn entity_driver(
        mut self,
        driver: Arc<dyn EntityRepository>,
        connection: Arc<dyn DurableConnection>,
    ) -> Self {
        self.entity = Some(Durable { driver, connection });
        self
    }

    /// Durable cache driver and its connection.
    pub fn cache_driver(
        mut self,
        driver: Arc<dyn CacheDriver>,
        connection: Arc<dyn DurableConnection>,
    ) -> Self {
        self.cache = Some(Durable { driver, connection });
        self
    }

    /// Extra failover observer, in addition to logging.
    pub fn observer(mut self, observer: Arc<dyn FailoverObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Built-in command.
    pub fn command(mut self, command: Arc<dyn CommandHandler>) -> Self {
        self.registry.register(command);
        self
    }

    /// Wire the services, connect durable drivers and start background tasks.
    ///
    /// A channel whose connection string is missing or a placeholder, or
    /// which has no driver, starts volatile without any connection attempt.
    /// A channel whose driver cannot connect within the retry policy also
    /// starts volatile and recovers when the driver reports a reconnect.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    #[instrument(skip(self))]
    pub async fn start(self) -> GuildkeepResult<Guildkeep> {
        self.config.validate()?;

        let controller = Arc::new(FailoverController::new());
        controller.add_observer(Arc::new(TracingObserver));
        for observer in self.observers {
            controller.add_observer(observer);
        }

        let volatile = Arc::new(VolatileStore::new());
        let mut store = StoreAdapter::new(controller.clone(), volatile);
        let mut cache = CacheLayer::new(controller.clone());
        let policy = self.config.database.connect_policy();
        let mut tasks = Vec::new();

        match Self::usable(&self.config, BackendChannel::Entity, self.entity) {
            Some(entity) => {
                store = store.with_durable(entity.driver);
                tasks.push(
                    controller
                        .attach(BackendChannel::Entity, entity.connection, policy)
                        .await,
                );
            }
            None => controller.force_volatile(BackendChannel::Entity, "durable store not configured"),
        }

        match Self::usable(&self.config, BackendChannel::Cache, self.cache) {
            Some(durable) => {
                cache = cache.with_durable(durable.driver);
                tasks.push(
                    controller
                        .attach(BackendChannel::Cache, durable.connection, policy)
                        .await,
                );
            }
            None => controller.force_volatile(BackendChannel::Cache, "durable cache not configured"),
        }

        let cache = Arc::new(cache);
        let governor = Arc::new(RateGovernor::new(&self.config.rate_limit));
        tasks.push(governor.spawn_sweeper());
        tasks.push(spawn_maintenance(
            cache.clone(),
            store.clone(),
            self.config.cache.sweep_interval(),
        ));

        let guildkeep = Guildkeep {
            config: self.config,
            controller,
            store,
            cache,
            governor,
            registry: self.registry,
            tasks,
        };
        info!(
            entity = %guildkeep.controller.mode(BackendChannel::Entity),
            cache = %guildkeep.controller.mode(BackendChannel::Cache),
            commands = guildkeep.registry.len(),
            "Guildkeep started"
        );
        Ok(guildkeep)
    }

    fn usable<T: ?Sized>(
        config: &GuildkeepConfig,
        channel: BackendChannel,
        durable: Option<Durable<T>>,
    ) -> Option<Durable<T>> {
        if config.database.usable_url(channel).is_none() {
            if durable.is_some() {
                warn!(channel = %channel, "Driver supplied without a usable connection string, ignoring it");
            }
            return None;
        }
        if durable.is_none() {
            warn!(channel = %channel, "Connection string configured but no driver supplied");
        }
        durable
    }
}

/// Running Guildkeep services.
///
/// Owns the failover controller, storage façade, cache, rate governor and
/// command registry, plus the background tasks that keep them tidy.
pub struct Guildkeep {
    config: GuildkeepConfig,
    controller: Arc<FailoverController>,
    store: StoreAdapter,
    cache: Arc<CacheLayer>,
    governor: Arc<RateGovernor>,
    registry: CommandRegistry,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Guildkeep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guildkeep")
            .field("controller", &self.controller)
            .field("registry", &self.registry)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Guildkeep {
    /// Start assembling services from `config`.
    pub fn builder(config: GuildkeepConfig) -> GuildkeepBuilder {
        GuildkeepBuilder {
            config,
            entity: None,
            cache: None,
            observers: Vec::new(),
            registry: CommandRegistry::new(),
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &GuildkeepConfig {
        &self.config
    }

    /// Failover controller.
    pub fn controller(&self) -> &Arc<FailoverController> {
        &self.controller
    }

    /// Storage façade.
    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    /// Short-lived key/value cache.
    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// Rate limits and cooldowns.
    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    /// Registered built-in commands.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Context for an invocation by `user_id` in `guild_id`.
    pub fn context(
        &self,
        guild_id: impl Into<String>,
        user_id: impl Into<String>,
        args: Vec<String>,
    ) -> CommandContext {
        CommandContext::new(guild_id.into(), user_id.into(), args, self.store.clone())
    }

    /// Route an invocation through the registry.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::dispatch`].
    pub async fn dispatch(&self, context: &CommandContext, name: &str) -> GuildkeepResult<Dispatch> {
        self.registry.dispatch(&self.governor, context, name).await
    }

    /// Current health.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            failover: self.controller.snapshot(),
            volatile: self.store.volatile().stats(),
            cache_entries: self.cache.len(),
            commands: self.registry.len(),
        }
    }

    /// Stop background tasks.
    ///
    /// Records held only in memory are not persisted anywhere; their counts
    /// are logged so an operator can see what an outage cost.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        let stats = self.store.volatile().stats();
        if stats.active {
            warn!(
                guilds = stats.guilds,
                users = stats.users,
                analytics_events = stats.analytics_events,
                moderation_cases = stats.moderation_cases,
                custom_commands = stats.custom_commands,
                "Discarding in-memory records at shutdown"
            );
        }
        info!("Guildkeep stopped");
    }
}

/// Periodically drop expired cache entries and analytics past retention.
fn spawn_maintenance(cache: Arc<CacheLayer>, store: StoreAdapter, period: Duration) -> JoinHandle<()> {
    info!(interval_secs = period.as_secs(), "Starting maintenance task");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = cache.cleanup_expired();
            match store.prune_analytics(retention_cutoff(Utc::now())).await {
                Ok(pruned) => debug!(expired, pruned, "Maintenance run complete"),
                Err(e) => warn!(error = %e, "Analytics pruning failed"),
            }
        }
    })
}
