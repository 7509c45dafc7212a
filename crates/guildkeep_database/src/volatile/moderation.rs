use super::VolatileStore;
use chrono::{DateTime, Utc};
use guildkeep_core::{CasePatch, ModerationCase, NewModerationCase};
use tracing::debug;

impl VolatileStore {
    /// Open a case under the guild's next case ID.
    pub fn create_case(&self, case: NewModerationCase) -> ModerationCase {
        let mut cases = self.cases.lock();
        let log = cases.entry(case.guild_id().clone()).or_default();
        let case_id = log.iter().map(|case| case.case_id).max().unwrap_or(0) + 1;
        let case = case.into_case(case_id, Utc::now());
        debug!(guild_id = %case.guild_id, case_id, action = %case.action, "Opening case in memory");
        log.push(case.clone());
        case
    }

    /// Look up one case.
    pub fn find_case(&self, guild_id: &str, case_id: u64) -> Option<ModerationCase> {
        self.cases
            .lock()
            .get(guild_id)?
            .iter()
            .find(|case| case.case_id == case_id)
            .cloned()
    }

    /// Merge `patch` into an existing case.
    pub fn update_case(
        &self,
        guild_id: &str,
        case_id: u64,
        patch: CasePatch,
    ) -> Option<ModerationCase> {
        let mut cases = self.cases.lock();
        let case = cases
            .get_mut(guild_id)?
            .iter_mut()
            .find(|case| case.case_id == case_id)?;
        patch.apply(case, Utc::now());
        Some(case.clone())
    }

    /// A guild's cases matching `filter`, newest first.
    fn select_cases(
        &self,
        guild_id: &str,
        limit: usize,
        filter: impl Fn(&ModerationCase) -> bool,
    ) -> Vec<ModerationCase> {
        let cases = self.cases.lock();
        let Some(log) = cases.get(guild_id) else {
            return Vec::new();
        };
        let mut selected: Vec<_> = log.iter().filter(|case| filter(case)).cloned().collect();
        selected.sort_by(|a, b| b.case_id.cmp(&a.case_id));
        selected.truncate(limit);
        selected
    }

    /// A guild's most recent cases, newest first.
    pub fn list_cases(&self, guild_id: &str, limit: usize) -> Vec<ModerationCase> {
        self.select_cases(guild_id, limit, |_| true)
    }

    /// A member's cases in a guild, newest first.
    pub fn user_cases(&self, guild_id: &str, user_id: &str, limit: usize) -> Vec<ModerationCase> {
        self.select_cases(guild_id, limit, |case| case.user_id == user_id)
    }

    /// A member's warnings that are active and unexpired at `now`.
    pub fn active_warnings(
        &self,
        guild_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<ModerationCase> {
        self.select_cases(guild_id, usize::MAX, |case| {
            case.user_id == user_id && case.is_active_warning(now)
        })
    }
}
