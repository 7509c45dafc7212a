use super::{StoreAdapter, require_key};
use chrono::Utc;
use guildkeep_core::{CasePatch, ModerationCase, NewModerationCase};
use guildkeep_error::StoreResult;
use guildkeep_interface::ModerationRepository;
use tracing::instrument;

impl StoreAdapter {
    /// Open a case under the guild's next case ID.
    #[instrument(
        skip(self, case),
        fields(guild_id = %case.guild_id(), action = %case.action())
    )]
    pub async fn create_case(&self, case: NewModerationCase) -> StoreResult<ModerationCase> {
        case.validate()?;
        route!(self, "create_case", |repo| repo.create_case(&case), || Ok(
            self.volatile.create_case(case)
        ))
    }

    /// Look up one case.
    #[instrument(skip(self))]
    pub async fn find_case(
        &self,
        guild_id: &str,
        case_id: u64,
    ) -> StoreResult<Option<ModerationCase>> {
        require_key("guild_id", guild_id)?;
        route!(self, "find_case", |repo| repo.find_case(guild_id, case_id), || Ok(
            self.volatile.find_case(guild_id, case_id)
        ))
    }

    /// Merge `patch` into a case. Returns `None` if the case does not exist.
    #[instrument(skip(self, patch))]
    pub async fn update_case(
        &self,
        guild_id: &str,
        case_id: u64,
        patch: CasePatch,
    ) -> StoreResult<Option<ModerationCase>> {
        require_key("guild_id", guild_id)?;
        patch.validate()?;
        route!(
            self,
            "update_case",
            |repo| repo.update_case(guild_id, case_id, &patch),
            || Ok(self.volatile.update_case(guild_id, case_id, patch))
        )
    }

    /// Mark a case inactive (expired or reversed). Cases are never removed.
    pub async fn deactivate_case(
        &self,
        guild_id: &str,
        case_id: u64,
    ) -> StoreResult<Option<ModerationCase>> {
        self.update_case(guild_id, case_id, CasePatch::deactivate())
            .await
    }

    /// A guild's most recent cases, newest first.
    #[instrument(skip(self))]
    pub async fn list_cases(&self, guild_id: &str, limit: usize) -> StoreResult<Vec<ModerationCase>> {
        require_key("guild_id", guild_id)?;
        route!(self, "list_cases", |repo| repo.list_cases(guild_id, limit), || Ok(
            self.volatile.list_cases(guild_id, limit)
        ))
    }

    /// A member's cases in a guild, newest first.
    #[instrument(skip(self))]
    pub async fn user_history(
        &self,
        guild_id: &str,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<ModerationCase>> {
        require_key("guild_id", guild_id)?;
        require_key("user_id", user_id)?;
        route!(
            self,
            "user_history",
            |repo| repo.user_cases(guild_id, user_id, limit),
            || Ok(self.volatile.user_cases(guild_id, user_id, limit))
        )
    }

    /// A member's warnings that are active and not yet expired.
    #[instrument(skip(self))]
    pub async fn active_warnings(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<ModerationCase>> {
        require_key("guild_id", guild_id)?;
        require_key("user_id", user_id)?;
        let now = Utc::now();
        route!(
            self,
            "active_warnings",
            |repo| repo.active_warnings(guild_id, user_id, now),
            || Ok(self.volatile.active_warnings(guild_id, user_id, now))
        )
    }
}
