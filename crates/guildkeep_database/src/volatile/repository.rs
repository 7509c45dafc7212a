//! Driver contracts served from memory.
//!
//! Lets a [`VolatileStore`] stand in wherever a durable driver is expected,
//! e.g. as the durable side of a test harness.

use super::VolatileStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guildkeep_core::{
    AnalyticsEvent, AnalyticsQuery, AnalyticsSummary, CasePatch, CustomCommandPatch,
    CustomCommandRecord, GuildPatch, GuildRecord, ModerationCase, NewAnalyticsEvent,
    NewCustomCommand, NewGuild, NewModerationCase, NewUser, UserPatch, UserRecord,
};
use guildkeep_interface::{
    AnalyticsRepository, BackendResult, CustomCommandRepository, GuildRepository,
    ModerationRepository, UserRepository,
};

#[async_trait]
impl GuildRepository for VolatileStore {
    async fn find_guild(&self, guild_id: &str) -> BackendResult<Option<GuildRecord>> {
        Ok(VolatileStore::find_guild(self, guild_id))
    }

    async fn create_guild(&self, guild: &NewGuild) -> BackendResult<GuildRecord> {
        Ok(VolatileStore::create_guild(self, guild.clone())?)
    }

    async fn update_guild(
        &self,
        guild_id: &str,
        patch: &GuildPatch,
    ) -> BackendResult<Option<GuildRecord>> {
        Ok(VolatileStore::update_guild(self, guild_id, patch.clone()))
    }

    async fn list_active_guilds(&self) -> BackendResult<Vec<GuildRecord>> {
        Ok(VolatileStore::list_active_guilds(self))
    }
}

#[async_trait]
impl UserRepository for VolatileStore {
    async fn find_user(&self, user_id: &str) -> BackendResult<Option<UserRecord>> {
        Ok(VolatileStore::find_user(self, user_id))
    }

    async fn create_user(&self, user: &NewUser) -> BackendResult<UserRecord> {
        Ok(VolatileStore::create_user(self, user.clone())?)
    }

    async fn update_user(
        &self,
        user_id: &str,
        patch: &UserPatch,
    ) -> BackendResult<Option<UserRecord>> {
        Ok(VolatileStore::update_user(self, user_id, patch.clone()))
    }

    async fn list_users_for_guild(&self, guild_id: &str) -> BackendResult<Vec<UserRecord>> {
        Ok(VolatileStore::list_users_for_guild(self, guild_id))
    }
}

#[async_trait]
impl AnalyticsRepository for VolatileStore {
    async fn append_event(&self, event: &NewAnalyticsEvent) -> BackendResult<AnalyticsEvent> {
        Ok(VolatileStore::append_event(self, event.clone()))
    }

    async fn list_events(
        &self,
        guild_id: &str,
        query: &AnalyticsQuery,
    ) -> BackendResult<Vec<AnalyticsEvent>> {
        Ok(VolatileStore::list_events(self, guild_id, query))
    }

    async fn summarize_events(
        &self,
        guild_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BackendResult<AnalyticsSummary> {
        Ok(VolatileStore::summarize_events(self, guild_id, since, until))
    }

    async fn prune_events(&self, before: DateTime<Utc>) -> BackendResult<u64> {
        Ok(VolatileStore::prune_events(self, before))
    }
}

#[async_trait]
impl ModerationRepository for VolatileStore {
    async fn create_case(&self, case: &NewModerationCase) -> BackendResult<ModerationCase> {
        Ok(VolatileStore::create_case(self, case.clone()))
    }

    async fn find_case(
        &self,
        guild_id: &str,
        case_id: u64,
    ) -> BackendResult<Option<ModerationCase>> {
        Ok(VolatileStore::find_case(self, guild_id, case_id))
    }

    async fn update_case(
        &self,
        guild_id: &str,
        case_id: u64,
        patch: &CasePatch,
    ) -> BackendResult<Option<ModerationCase>> {
        Ok(VolatileStore::update_case(self, guild_id, case_id, patch.clone()))
    }

    async fn list_cases(&self, guild_id: &str, limit: usize) -> BackendResult<Vec<ModerationCase>> {
        Ok(VolatileStore::list_cases(self, guild_id, limit))
    }

    async fn user_cases(
        &self,
        guild_id: &str,
        user_id: &str,
        limit: usize,
    ) -> BackendResult<Vec<ModerationCase>> {
        Ok(VolatileStore::user_cases(self, guild_id, user_id, limit))
    }

    async fn active_warnings(
        &self,
        guild_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> BackendResult<Vec<ModerationCase>> {
        Ok(VolatileStore::active_warnings(self, guild_id, user_id, now))
    }
}

#[async_trait]
impl CustomCommandRepository for VolatileStore {
    async fn create_command(
        &self,
        command: &NewCustomCommand,
    ) -> BackendResult<CustomCommandRecord> {
        Ok(VolatileStore::create_command(self, command.clone())?)
    }

    async fn find_command(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> BackendResult<Option<CustomCommandRecord>> {
        Ok(VolatileStore::find_command(self, guild_id, trigger))
    }

    async fn update_command(
        &self,
        guild_id: &str,
        trigger: &str,
        patch: &CustomCommandPatch,
    ) -> BackendResult<Option<CustomCommandRecord>> {
        Ok(VolatileStore::update_command(self, guild_id, trigger, patch.clone()))
    }

    async fn list_commands(&self, guild_id: &str) -> BackendResult<Vec<CustomCommandRecord>> {
        Ok(VolatileStore::list_commands(self, guild_id))
    }

    async fn search_commands(
        &self,
        guild_id: &str,
        query: &str,
    ) -> BackendResult<Vec<CustomCommandRecord>> {
        Ok(VolatileStore::search_commands(self, guild_id, query))
    }

    async fn record_command_use(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> BackendResult<Option<CustomCommandRecord>> {
        Ok(VolatileStore::record_command_use(self, guild_id, trigger))
    }

    async fn most_used_commands(
        &self,
        guild_id: &str,
        limit: usize,
    ) -> BackendResult<Vec<CustomCommandRecord>> {
        Ok(VolatileStore::most_used_commands(self, guild_id, limit))
    }
}
