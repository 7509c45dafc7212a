use super::{StoreAdapter, require_key};
use chrono::Utc;
use guildkeep_core::{GuildRole, NewUser, UserPatch, UserRecord};
use guildkeep_error::{BackendError, StoreResult};
use guildkeep_interface::{BackendResult, EntityRepository, UserRepository};
use tracing::instrument;

async fn durable_find_or_create(
    repo: &dyn EntityRepository,
    user: &NewUser,
) -> BackendResult<UserRecord> {
    if let Some(existing) = repo.find_user(&user.user_id).await? {
        return Ok(existing);
    }
    match repo.create_user(user).await {
        Err(err) if err.is_conflict() => repo
            .find_user(&user.user_id)
            .await?
            .ok_or_else(|| BackendError::query("user vanished after insert conflict")),
        result => result,
    }
}

impl StoreAdapter {
    /// Look up a user by ID.
    #[instrument(skip(self))]
    pub async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        require_key("user_id", user_id)?;
        route!(self, "find_user", |repo| repo.find_user(user_id), || Ok(
            self.volatile.find_user(user_id)
        ))
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input and a conflict if the
    /// user already exists.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        user.validate()?;
        route!(self, "create_user", |repo| repo.create_user(&user), || self
            .volatile
            .create_user(user))
    }

    /// Merge `patch` into a user. Returns `None` if the user does not exist.
    #[instrument(skip(self, patch))]
    pub async fn update_user(
        &self,
        user_id: &str,
        patch: UserPatch,
    ) -> StoreResult<Option<UserRecord>> {
        require_key("user_id", user_id)?;
        patch.validate()?;
        route!(self, "update_user", |repo| repo.update_user(user_id, &patch), || Ok(
            self.volatile.update_user(user_id, patch)
        ))
    }

    /// Return the user, creating it on first authentication.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn find_or_create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        user.validate()?;
        route!(
            self,
            "find_or_create_user",
            |repo| durable_find_or_create(repo.as_ref(), &user),
            || Ok(self.volatile.find_or_create_user(user))
        )
    }

    /// Stamp a login for the user.
    pub async fn record_login(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        self.update_user(user_id, UserPatch::login(Utc::now())).await
    }

    /// Soft-delete a user. Returns `None` if the user does not exist.
    pub async fn delete_user(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        self.update_user(user_id, UserPatch::deactivate()).await
    }

    /// Active users holding a grant for `guild_id`.
    #[instrument(skip(self))]
    pub async fn list_users_for_guild(&self, guild_id: &str) -> StoreResult<Vec<UserRecord>> {
        require_key("guild_id", guild_id)?;
        route!(self, "list_users_for_guild", |repo| repo.list_users_for_guild(guild_id), || Ok(
            self.volatile.list_users_for_guild(guild_id)
        ))
    }

    /// Whether the user may access `guild_id`. Unknown or inactive users may not.
    pub async fn has_guild_access(&self, user_id: &str, guild_id: &str) -> StoreResult<bool> {
        Ok(self
            .find_user(user_id)
            .await?
            .is_some_and(|user| user.active && user.has_guild_access(guild_id)))
    }

    /// The user's role in `guild_id`, if any.
    pub async fn guild_role(&self, user_id: &str, guild_id: &str) -> StoreResult<Option<GuildRole>> {
        Ok(self
            .find_user(user_id)
            .await?
            .and_then(|user| user.guild_role(guild_id)))
    }
}
