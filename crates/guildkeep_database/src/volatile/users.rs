use super::VolatileStore;
use chrono::Utc;
use guildkeep_core::{NewUser, UserPatch, UserRecord};
use guildkeep_error::{StoreError, StoreResult};
use std::collections::hash_map::Entry;
use tracing::debug;

impl VolatileStore {
    /// Look up a user.
    pub fn find_user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.lock().get(user_id).cloned()
    }

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the user ID is taken.
    pub fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut users = self.users.lock();
        match users.entry(user.user_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::conflict("user", user.user_id)),
            Entry::Vacant(slot) => {
                debug!(user_id = %user.user_id, "Creating user in memory");
                Ok(slot.insert(user.into_record(Utc::now())).clone())
            }
        }
    }

    /// Return the user, creating it first if absent.
    pub fn find_or_create_user(&self, user: NewUser) -> UserRecord {
        self.users
            .lock()
            .entry(user.user_id.clone())
            .or_insert_with(|| user.into_record(Utc::now()))
            .clone()
    }

    /// Merge `patch` into an existing user.
    pub fn update_user(&self, user_id: &str, patch: UserPatch) -> Option<UserRecord> {
        let mut users = self.users.lock();
        let record = users.get_mut(user_id)?;
        patch.apply(record, Utc::now());
        Some(record.clone())
    }

    /// Active users with an explicit grant for `guild_id`, ordered by ID.
    pub fn list_users_for_guild(&self, guild_id: &str) -> Vec<UserRecord> {
        let mut users: Vec<_> = self
            .users
            .lock()
            .values()
            .filter(|user| user.active && user.guild_role(guild_id).is_some())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        users
    }
}
