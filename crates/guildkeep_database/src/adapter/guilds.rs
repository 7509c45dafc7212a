use super::{StoreAdapter, require_key};
use guildkeep_core::{GuildPatch, GuildRecord, NewGuild};
use guildkeep_error::{BackendError, StoreResult};
use guildkeep_interface::{BackendResult, EntityRepository, GuildRepository};
use tracing::instrument;

/// Find, then create, then re-find if a concurrent caller won the insert.
async fn durable_find_or_create(
    repo: &dyn EntityRepository,
    guild: &NewGuild,
) -> BackendResult<GuildRecord> {
    if let Some(existing) = repo.find_guild(&guild.guild_id).await? {
        return Ok(existing);
    }
    match repo.create_guild(guild).await {
        Err(err) if err.is_conflict() => repo
            .find_guild(&guild.guild_id)
            .await?
            .ok_or_else(|| BackendError::query("guild vanished after insert conflict")),
        result => result,
    }
}

impl StoreAdapter {
    /// Look up a guild by ID, including soft-deleted ones.
    #[instrument(skip(self))]
    pub async fn find_guild(&self, guild_id: &str) -> StoreResult<Option<GuildRecord>> {
        require_key("guild_id", guild_id)?;
        route!(self, "find_guild", |repo| repo.find_guild(guild_id), || Ok(
            self.volatile.find_guild(guild_id)
        ))
    }

    /// Create a guild.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input and a conflict if the
    /// guild already exists.
    #[instrument(skip(self, guild), fields(guild_id = %guild.guild_id))]
    pub async fn create_guild(&self, guild: NewGuild) -> StoreResult<GuildRecord> {
        guild.validate()?;
        route!(self, "create_guild", |repo| repo.create_guild(&guild), || self
            .volatile
            .create_guild(guild))
    }

    /// Merge `patch` into a guild. Returns `None` if the guild does not exist.
    #[instrument(skip(self, patch))]
    pub async fn update_guild(
        &self,
        guild_id: &str,
        patch: GuildPatch,
    ) -> StoreResult<Option<GuildRecord>> {
        require_key("guild_id", guild_id)?;
        patch.validate()?;
        route!(self, "update_guild", |repo| repo.update_guild(guild_id, &patch), || Ok(
            self.volatile.update_guild(guild_id, patch)
        ))
    }

    /// Return the guild, creating it on first contact.
    ///
    /// Concurrent callers racing on a new guild all receive the same record
    /// and exactly one is created.
    #[instrument(skip(self, guild), fields(guild_id = %guild.guild_id))]
    pub async fn find_or_create_guild(&self, guild: NewGuild) -> StoreResult<GuildRecord> {
        guild.validate()?;
        route!(
            self,
            "find_or_create_guild",
            |repo| durable_find_or_create(repo.as_ref(), &guild),
            || Ok(self.volatile.find_or_create_guild(guild))
        )
    }

    /// Soft-delete a guild. Returns `None` if the guild does not exist.
    pub async fn delete_guild(&self, guild_id: &str) -> StoreResult<Option<GuildRecord>> {
        self.update_guild(guild_id, GuildPatch::deactivate()).await
    }

    /// Guilds that are not soft-deleted.
    #[instrument(skip(self))]
    pub async fn list_active_guilds(&self) -> StoreResult<Vec<GuildRecord>> {
        route!(self, "list_active_guilds", |repo| repo.list_active_guilds(), || Ok(
            self.volatile.list_active_guilds()
        ))
    }
}
