use super::VolatileStore;
use chrono::Utc;
use guildkeep_core::{GuildPatch, GuildRecord, NewGuild};
use guildkeep_error::{StoreError, StoreResult};
use std::collections::hash_map::Entry;
use tracing::debug;

impl VolatileStore {
    /// Look up a guild, active or not.
    pub fn find_guild(&self, guild_id: &str) -> Option<GuildRecord> {
        self.guilds.lock().get(guild_id).cloned()
    }

    /// Insert a guild.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the guild ID is taken.
    pub fn create_guild(&self, guild: NewGuild) -> StoreResult<GuildRecord> {
        let mut guilds = self.guilds.lock();
        match guilds.entry(guild.guild_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::conflict("guild", guild.guild_id)),
            Entry::Vacant(slot) => {
                debug!(guild_id = %guild.guild_id, "Creating guild in memory");
                Ok(slot.insert(guild.into_record(Utc::now())).clone())
            }
        }
    }

    /// Return the guild, creating it first if absent.
    pub fn find_or_create_guild(&self, guild: NewGuild) -> GuildRecord {
        self.guilds
            .lock()
            .entry(guild.guild_id.clone())
            .or_insert_with(|| guild.into_record(Utc::now()))
            .clone()
    }

    /// Merge `patch` into an existing guild.
    pub fn update_guild(&self, guild_id: &str, patch: GuildPatch) -> Option<GuildRecord> {
        let mut guilds = self.guilds.lock();
        let record = guilds.get_mut(guild_id)?;
        patch.apply(record, Utc::now());
        Some(record.clone())
    }

    /// Guilds not soft-deleted, ordered by ID.
    pub fn list_active_guilds(&self) -> Vec<GuildRecord> {
        let mut active: Vec<_> = self
            .guilds
            .lock()
            .values()
            .filter(|guild| guild.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.guild_id.cmp(&b.guild_id));
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_duplicate_id() {
        let store = VolatileStore::new();
        store.create_guild(NewGuild::new("g1", "One", "o")).unwrap();

        let err = store
            .create_guild(NewGuild::new("g1", "Other", "o"))
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.find_guild("g1").unwrap().name, "One");
    }

    #[test]
    fn update_never_creates() {
        let store = VolatileStore::new();
        assert!(store.update_guild("missing", GuildPatch::deactivate()).is_none());
        assert!(store.find_guild("missing").is_none());
    }

    #[test]
    fn soft_deleted_guilds_are_not_listed() {
        let store = VolatileStore::new();
        store.create_guild(NewGuild::new("g2", "Two", "o")).unwrap();
        store.create_guild(NewGuild::new("g1", "One", "o")).unwrap();
        store.update_guild("g2", GuildPatch::deactivate()).unwrap();

        let listed: Vec<_> = store
            .list_active_guilds()
            .into_iter()
            .map(|guild| guild.guild_id)
            .collect();
        assert_eq!(listed, vec!["g1"]);
        assert!(store.find_guild("g2").is_some());
    }
}
