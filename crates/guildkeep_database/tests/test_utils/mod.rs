//! Durable driver double backed by a volatile store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guildkeep_core::{
    AnalyticsEvent, AnalyticsQuery, AnalyticsSummary, CasePatch, CustomCommandPatch,
    CustomCommandRecord, GuildPatch, GuildRecord, ModerationCase, NewAnalyticsEvent,
    NewCustomCommand, NewGuild, NewModerationCase, NewUser, UserPatch, UserRecord,
};
use guildkeep_database::{StoreAdapter, VolatileStore};
use guildkeep_error::BackendError;
use guildkeep_failover::FailoverController;
use guildkeep_interface::{
    AnalyticsRepository, BackendResult, CustomCommandRepository, GuildRepository,
    ModerationRepository, UserRepository,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the next driver calls fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Connectivity,
    Query,
}

/// Durable driver that stores in its own volatile store and can be told to fail.
#[derive(Debug)]
pub struct FlakyRepository {
    pub inner: VolatileStore,
    failure: Mutex<Failure>,
    calls: AtomicUsize,
}

impl FlakyRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: VolatileStore::new(),
            failure: Mutex::new(Failure::None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_with(&self, failure: Failure) {
        *self.failure.lock() = failure;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> BackendResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.failure.lock() {
            Failure::None => Ok(()),
            Failure::Connectivity => Err(BackendError::connectivity("connection reset by peer")),
            Failure::Query => Err(BackendError::query("write concern timeout")),
        }
    }
}

macro_rules! flaky_impl {
    ($trait:ident { $( fn $name:ident(&self $(, $arg:ident : $ty:ty)*) -> $ret:ty; )* }) => {
        #[async_trait]
        impl $trait for FlakyRepository {
            $(
                async fn $name(&self $(, $arg: $ty)*) -> $ret {
                    self.check()?;
                    $trait::$name(&self.inner $(, $arg)*).await
                }
            )*
        }
    };
}

flaky_impl!(GuildRepository {
    fn find_guild(&self, guild_id: &str) -> BackendResult<Option<GuildRecord>>;
    fn create_guild(&self, guild: &NewGuild) -> BackendResult<GuildRecord>;
    fn update_guild(&self, guild_id: &str, patch: &GuildPatch) -> BackendResult<Option<GuildRecord>>;
    fn list_active_guilds(&self) -> BackendResult<Vec<GuildRecord>>;
});

flaky_impl!(UserRepository {
    fn find_user(&self, user_id: &str) -> BackendResult<Option<UserRecord>>;
    fn create_user(&self, user: &NewUser) -> BackendResult<UserRecord>;
    fn update_user(&self, user_id: &str, patch: &UserPatch) -> BackendResult<Option<UserRecord>>;
    fn list_users_for_guild(&self, guild_id: &str) -> BackendResult<Vec<UserRecord>>;
});

flaky_impl!(AnalyticsRepository {
    fn append_event(&self, event: &NewAnalyticsEvent) -> BackendResult<AnalyticsEvent>;
    fn list_events(&self, guild_id: &str, query: &AnalyticsQuery) -> BackendResult<Vec<AnalyticsEvent>>;
    fn summarize_events(&self, guild_id: &str, since: DateTime<Utc>, until: DateTime<Utc>) -> BackendResult<AnalyticsSummary>;
    fn prune_events(&self, before: DateTime<Utc>) -> BackendResult<u64>;
});

flaky_impl!(ModerationRepository {
    fn create_case(&self, case: &NewModerationCase) -> BackendResult<ModerationCase>;
    fn find_case(&self, guild_id: &str, case_id: u64) -> BackendResult<Option<ModerationCase>>;
    fn update_case(&self, guild_id: &str, case_id: u64, patch: &CasePatch) -> BackendResult<Option<ModerationCase>>;
    fn list_cases(&self, guild_id: &str, limit: usize) -> BackendResult<Vec<ModerationCase>>;
    fn user_cases(&self, guild_id: &str, user_id: &str, limit: usize) -> BackendResult<Vec<ModerationCase>>;
    fn active_warnings(&self, guild_id: &str, user_id: &str, now: DateTime<Utc>) -> BackendResult<Vec<ModerationCase>>;
});

flaky_impl!(CustomCommandRepository {
    fn create_command(&self, command: &NewCustomCommand) -> BackendResult<CustomCommandRecord>;
    fn find_command(&self, guild_id: &str, trigger: &str) -> BackendResult<Option<CustomCommandRecord>>;
    fn update_command(&self, guild_id: &str, trigger: &str, patch: &CustomCommandPatch) -> BackendResult<Option<CustomCommandRecord>>;
    fn list_commands(&self, guild_id: &str) -> BackendResult<Vec<CustomCommandRecord>>;
    fn search_commands(&self, guild_id: &str, query: &str) -> BackendResult<Vec<CustomCommandRecord>>;
    fn record_command_use(&self, guild_id: &str, trigger: &str) -> BackendResult<Option<CustomCommandRecord>>;
    fn most_used_commands(&self, guild_id: &str, limit: usize) -> BackendResult<Vec<CustomCommandRecord>>;
});

/// Adapter wired to a fresh controller, volatile store and flaky driver.
pub fn harness() -> (StoreAdapter, Arc<FlakyRepository>) {
    let durable = FlakyRepository::new();
    let adapter = StoreAdapter::new(
        Arc::new(FailoverController::new()),
        Arc::new(VolatileStore::new()),
    )
    .with_durable(durable.clone());
    (adapter, durable)
}

/// Adapter with no durable driver and the entity channel volatile.
pub fn volatile_only() -> StoreAdapter {
    let controller = Arc::new(FailoverController::new());
    controller.force_volatile(guildkeep_failover::BackendChannel::Entity, "no entity url");
    StoreAdapter::new(controller, Arc::new(VolatileStore::new()))
}
