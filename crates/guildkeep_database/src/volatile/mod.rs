//! In-process fallback store.

mod analytics;
mod commands;
mod guilds;
mod moderation;
mod repository;
mod snapshot;
mod users;

pub use snapshot::{VolatileSnapshot, VolatileStats};

use guildkeep_core::{
    AnalyticsEvent, CustomCommandRecord, GuildRecord, ModerationCase, UserRecord,
};
use guildkeep_failover::VolatileActivation;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument};

/// Memory-only store that upholds every entity invariant.
///
/// Each collection sits behind its own mutex and every read-modify-write
/// (case ID allocation, find-or-create, trigger uniqueness) happens inside
/// one critical section. No lock is ever held across an `.await`.
///
/// The store serves requests whether or not it has been activated;
/// activation only marks the moment failover first relied on it.
#[derive(Debug, Default)]
pub struct VolatileStore {
    active: AtomicBool,
    guilds: Mutex<HashMap<String, GuildRecord>>,
    users: Mutex<HashMap<String, UserRecord>>,
    analytics: Mutex<HashMap<String, VecDeque<AnalyticsEvent>>>,
    cases: Mutex<HashMap<String, Vec<ModerationCase>>>,
    commands: Mutex<HashMap<String, Vec<CustomCommandRecord>>>,
}

impl VolatileStore {
    /// Empty, inactive store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the store as serving traffic. Idempotent.
    pub fn activate(&self) {
        if !self.active.swap(true, Ordering::AcqRel) {
            info!("Volatile store activated; data will not survive a restart");
        }
    }

    /// Whether failover has switched to this store at least once.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Record counts per collection.
    pub fn stats(&self) -> VolatileStats {
        VolatileStats {
            active: self.is_active(),
            guilds: self.guilds.lock().len(),
            users: self.users.lock().len(),
            analytics_events: self.analytics.lock().values().map(VecDeque::len).sum(),
            moderation_cases: self.cases.lock().values().map(Vec::len).sum(),
            custom_commands: self.commands.lock().values().map(Vec::len).sum(),
        }
    }

    /// Drop every record. The activation flag is kept.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        self.guilds.lock().clear();
        self.users.lock().clear();
        self.analytics.lock().clear();
        self.cases.lock().clear();
        self.commands.lock().clear();
        info!("Volatile store cleared");
    }
}

impl VolatileActivation for VolatileStore {
    fn activate(&self) {
        VolatileStore::activate(self);
    }
}
