//! Per-entity repository contracts.
//!
//! Each trait covers one collection. Lookups report missing records as
//! `Ok(None)`; creates report uniqueness violations as a conflict
//! [`BackendError`]. Soft deletion is expressed through the update methods.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guildkeep_core::{
    AnalyticsEvent, AnalyticsQuery, AnalyticsSummary, CasePatch, CustomCommandPatch,
    CustomCommandRecord, GuildPatch, GuildRecord, ModerationCase, NewAnalyticsEvent,
    NewCustomCommand, NewGuild, NewModerationCase, NewUser, UserPatch, UserRecord,
};
use guildkeep_error::BackendError;

/// Result type for driver operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Guild configuration storage.
#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// Load a guild by ID, active or not.
    async fn find_guild(&self, guild_id: &str) -> BackendResult<Option<GuildRecord>>;

    /// Insert a guild; fails with a conflict if the ID exists.
    async fn create_guild(&self, guild: &NewGuild) -> BackendResult<GuildRecord>;

    /// Merge `patch` into an existing guild. Never creates.
    async fn update_guild(
        &self,
        guild_id: &str,
        patch: &GuildPatch,
    ) -> BackendResult<Option<GuildRecord>>;

    /// All guilds not soft-deleted.
    async fn list_active_guilds(&self) -> BackendResult<Vec<GuildRecord>>;
}

/// User profile storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load a user by ID.
    async fn find_user(&self, user_id: &str) -> BackendResult<Option<UserRecord>>;

    /// Insert a user; fails with a conflict if the ID exists.
    async fn create_user(&self, user: &NewUser) -> BackendResult<UserRecord>;

    /// Merge `patch` into an existing user. Never creates.
    async fn update_user(
        &self,
        user_id: &str,
        patch: &UserPatch,
    ) -> BackendResult<Option<UserRecord>>;

    /// Active users holding a grant for `guild_id`.
    async fn list_users_for_guild(&self, guild_id: &str) -> BackendResult<Vec<UserRecord>>;
}

/// Append-only analytics log.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Append one event, enforcing the per-guild cap.
    async fn append_event(&self, event: &NewAnalyticsEvent) -> BackendResult<AnalyticsEvent>;

    /// A guild's events inside the retention window, newest first.
    async fn list_events(
        &self,
        guild_id: &str,
        query: &AnalyticsQuery,
    ) -> BackendResult<Vec<AnalyticsEvent>>;

    /// Count a guild's events with `since <= timestamp <= until`.
    async fn summarize_events(
        &self,
        guild_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BackendResult<AnalyticsSummary>;

    /// Remove every event older than `before`, returning how many were removed.
    async fn prune_events(&self, before: DateTime<Utc>) -> BackendResult<u64>;
}

/// Moderation case log.
#[async_trait]
pub trait ModerationRepository: Send + Sync {
    /// Insert a case under the next case ID for its guild.
    async fn create_case(&self, case: &NewModerationCase) -> BackendResult<ModerationCase>;

    /// Load one case.
    async fn find_case(&self, guild_id: &str, case_id: u64)
    -> BackendResult<Option<ModerationCase>>;

    /// Merge `patch` into an existing case. Never creates.
    async fn update_case(
        &self,
        guild_id: &str,
        case_id: u64,
        patch: &CasePatch,
    ) -> BackendResult<Option<ModerationCase>>;

    /// A guild's most recent cases, newest first.
    async fn list_cases(&self, guild_id: &str, limit: usize) -> BackendResult<Vec<ModerationCase>>;

    /// A member's cases in a guild, newest first.
    async fn user_cases(
        &self,
        guild_id: &str,
        user_id: &str,
        limit: usize,
    ) -> BackendResult<Vec<ModerationCase>>;

    /// A member's warnings that are active and unexpired at `now`.
    async fn active_warnings(
        &self,
        guild_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> BackendResult<Vec<ModerationCase>>;
}

/// Custom command storage. Triggers compare case-insensitively.
#[async_trait]
pub trait CustomCommandRepository: Send + Sync {
    /// Insert a command; fails with a conflict if the trigger is taken in the guild.
    async fn create_command(&self, command: &NewCustomCommand)
    -> BackendResult<CustomCommandRecord>;

    /// The enabled command answering to `trigger`.
    async fn find_command(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> BackendResult<Option<CustomCommandRecord>>;

    /// Merge `patch` into the command with `trigger`, enabled or not.
    async fn update_command(
        &self,
        guild_id: &str,
        trigger: &str,
        patch: &CustomCommandPatch,
    ) -> BackendResult<Option<CustomCommandRecord>>;

    /// Every command in the guild, in creation order.
    async fn list_commands(&self, guild_id: &str) -> BackendResult<Vec<CustomCommandRecord>>;

    /// Enabled commands whose name, description or trigger contain `query`.
    async fn search_commands(
        &self,
        guild_id: &str,
        query: &str,
    ) -> BackendResult<Vec<CustomCommandRecord>>;

    /// Count one use of the enabled command answering to `trigger`.
    async fn record_command_use(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> BackendResult<Option<CustomCommandRecord>>;

    /// Enabled commands ordered by use count, highest first.
    async fn most_used_commands(
        &self,
        guild_id: &str,
        limit: usize,
    ) -> BackendResult<Vec<CustomCommandRecord>>;
}

/// A backend that stores every entity collection.
pub trait EntityRepository:
    GuildRepository
    + UserRepository
    + AnalyticsRepository
    + ModerationRepository
    + CustomCommandRepository
{
}

impl<T> EntityRepository for T where
    T: GuildRepository
        + UserRepository
        + AnalyticsRepository
        + ModerationRepository
        + CustomCommandRepository
{
}
