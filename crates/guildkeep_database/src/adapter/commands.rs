use super::{StoreAdapter, require_key};
use guildkeep_core::{CustomCommandPatch, CustomCommandRecord, NewCustomCommand};
use guildkeep_error::StoreResult;
use guildkeep_interface::{BackendResult, CustomCommandRepository, EntityRepository};
use tracing::instrument;

/// Find, then create, then re-find if a concurrent caller won the insert.
async fn durable_find_or_create(
    repo: &dyn EntityRepository,
    command: &NewCustomCommand,
) -> BackendResult<CustomCommandRecord> {
    let (guild_id, trigger) = (command.guild_id(), command.trigger());
    if let Some(existing) = repo.find_command(guild_id, trigger).await? {
        return Ok(existing);
    }
    match repo.create_command(command).await {
        Err(err) if err.is_conflict() => match repo.find_command(guild_id, trigger).await? {
            Some(existing) => Ok(existing),
            None => Err(err),
        },
        result => result,
    }
}

impl StoreAdapter {
    /// Create a custom command.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input and a conflict if the
    /// guild already has a command with the same trigger, ignoring case.
    #[instrument(
        skip(self, command),
        fields(guild_id = %command.guild_id(), trigger = %command.trigger())
    )]
    pub async fn create_custom_command(
        &self,
        command: NewCustomCommand,
    ) -> StoreResult<CustomCommandRecord> {
        command.validate()?;
        route!(self, "create_custom_command", |repo| repo.create_command(&command), || self
            .volatile
            .create_command(command))
    }

    /// Return the enabled command holding the trigger, creating it if the
    /// trigger is free.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input and a conflict if a
    /// disabled command holds the trigger.
    #[instrument(
        skip(self, command),
        fields(guild_id = %command.guild_id(), trigger = %command.trigger())
    )]
    pub async fn find_or_create_custom_command(
        &self,
        command: NewCustomCommand,
    ) -> StoreResult<CustomCommandRecord> {
        command.validate()?;
        route!(
            self,
            "find_or_create_custom_command",
            |repo| durable_find_or_create(repo.as_ref(), &command),
            || self.volatile.find_or_create_command(command)
        )
    }

    /// The enabled command answering to `trigger`, ignoring case.
    #[instrument(skip(self))]
    pub async fn find_custom_command(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> StoreResult<Option<CustomCommandRecord>> {
        require_key("guild_id", guild_id)?;
        require_key("trigger", trigger)?;
        route!(
            self,
            "find_custom_command",
            |repo| repo.find_command(guild_id, trigger),
            || Ok(self.volatile.find_command(guild_id, trigger))
        )
    }

    /// Merge `patch` into the command with `trigger`, enabled or not.
    #[instrument(skip(self, patch))]
    pub async fn update_custom_command(
        &self,
        guild_id: &str,
        trigger: &str,
        patch: CustomCommandPatch,
    ) -> StoreResult<Option<CustomCommandRecord>> {
        require_key("guild_id", guild_id)?;
        require_key("trigger", trigger)?;
        patch.validate()?;
        route!(
            self,
            "update_custom_command",
            |repo| repo.update_command(guild_id, trigger, &patch),
            || Ok(self.volatile.update_command(guild_id, trigger, patch))
        )
    }

    /// Disable a command. Returns `None` if no command has `trigger`.
    pub async fn delete_custom_command(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> StoreResult<Option<CustomCommandRecord>> {
        self.update_custom_command(guild_id, trigger, CustomCommandPatch::disable())
            .await
    }

    /// Every command in the guild, enabled or not.
    #[instrument(skip(self))]
    pub async fn list_custom_commands(
        &self,
        guild_id: &str,
    ) -> StoreResult<Vec<CustomCommandRecord>> {
        require_key("guild_id", guild_id)?;
        route!(self, "list_custom_commands", |repo| repo.list_commands(guild_id), || Ok(
            self.volatile.list_commands(guild_id)
        ))
    }

    /// Enabled commands whose name, description or trigger contain `query`.
    #[instrument(skip(self))]
    pub async fn search_custom_commands(
        &self,
        guild_id: &str,
        query: &str,
    ) -> StoreResult<Vec<CustomCommandRecord>> {
        require_key("guild_id", guild_id)?;
        route!(
            self,
            "search_custom_commands",
            |repo| repo.search_commands(guild_id, query),
            || Ok(self.volatile.search_commands(guild_id, query))
        )
    }

    /// Count one invocation of the enabled command answering to `trigger`.
    #[instrument(skip(self))]
    pub async fn record_command_use(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> StoreResult<Option<CustomCommandRecord>> {
        require_key("guild_id", guild_id)?;
        require_key("trigger", trigger)?;
        route!(
            self,
            "record_command_use",
            |repo| repo.record_command_use(guild_id, trigger),
            || Ok(self.volatile.record_command_use(guild_id, trigger))
        )
    }

    /// Enabled commands by use count, highest first.
    #[instrument(skip(self))]
    pub async fn most_used_commands(
        &self,
        guild_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<CustomCommandRecord>> {
        require_key("guild_id", guild_id)?;
        route!(
            self,
            "most_used_commands",
            |repo| repo.most_used_commands(guild_id, limit),
            || Ok(self.volatile.most_used_commands(guild_id, limit))
        )
    }
}
