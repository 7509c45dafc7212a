use super::VolatileStore;
use chrono::Utc;
use guildkeep_core::{CustomCommandPatch, CustomCommandRecord, NewCustomCommand};
use guildkeep_error::{StoreError, StoreResult};
use tracing::debug;

impl VolatileStore {
    /// Insert a command.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the guild already has a command with the same
    /// trigger, compared case-insensitively and including disabled commands.
    pub fn create_command(&self, command: NewCustomCommand) -> StoreResult<CustomCommandRecord> {
        let mut commands = self.commands.lock();
        let guild = commands.entry(command.guild_id().clone()).or_default();
        if guild
            .iter()
            .any(|existing| existing.matches_trigger(command.trigger()))
        {
            return Err(StoreError::conflict(
                "custom_command",
                format!("{}/{}", command.guild_id(), command.trigger_key()),
            ));
        }
        let record = command.into_record(Utc::now());
        debug!(guild_id = %record.guild_id, trigger = %record.trigger, "Creating command in memory");
        guild.push(record.clone());
        Ok(record)
    }

    /// Return the enabled command holding the trigger, creating it if the
    /// trigger is free.
    ///
    /// # Errors
    ///
    /// Returns a conflict if a disabled command holds the trigger.
    pub fn find_or_create_command(
        &self,
        command: NewCustomCommand,
    ) -> StoreResult<CustomCommandRecord> {
        let mut commands = self.commands.lock();
        let guild = commands.entry(command.guild_id().clone()).or_default();
        if let Some(existing) = guild
            .iter()
            .find(|existing| existing.matches_trigger(command.trigger()))
        {
            if existing.enabled {
                return Ok(existing.clone());
            }
            return Err(StoreError::conflict(
                "custom_command",
                format!("{}/{}", command.guild_id(), command.trigger_key()),
            ));
        }
        let record = command.into_record(Utc::now());
        guild.push(record.clone());
        Ok(record)
    }

    /// The first enabled command answering to `trigger`, in creation order.
    pub fn find_command(&self, guild_id: &str, trigger: &str) -> Option<CustomCommandRecord> {
        self.commands
            .lock()
            .get(guild_id)?
            .iter()
            .find(|command| command.enabled && command.matches_trigger(trigger))
            .cloned()
    }

    /// Merge `patch` into the command with `trigger`, enabled or not.
    pub fn update_command(
        &self,
        guild_id: &str,
        trigger: &str,
        patch: CustomCommandPatch,
    ) -> Option<CustomCommandRecord> {
        let mut commands = self.commands.lock();
        let command = commands
            .get_mut(guild_id)?
            .iter_mut()
            .find(|command| command.matches_trigger(trigger))?;
        patch.apply(command, Utc::now());
        Some(command.clone())
    }

    /// Every command in the guild, in creation order.
    pub fn list_commands(&self, guild_id: &str) -> Vec<CustomCommandRecord> {
        self.commands
            .lock()
            .get(guild_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Enabled commands whose text fields contain `query`, ignoring case.
    pub fn search_commands(&self, guild_id: &str, query: &str) -> Vec<CustomCommandRecord> {
        self.commands
            .lock()
            .get(guild_id)
            .map(|commands| {
                commands
                    .iter()
                    .filter(|command| command.enabled && command.matches_query(query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Count one use of the enabled command answering to `trigger`.
    pub fn record_command_use(
        &self,
        guild_id: &str,
        trigger: &str,
    ) -> Option<CustomCommandRecord> {
        let mut commands = self.commands.lock();
        let command = commands
            .get_mut(guild_id)?
            .iter_mut()
            .find(|command| command.enabled && command.matches_trigger(trigger))?;
        command.record_use(Utc::now());
        Some(command.clone())
    }

    /// Enabled commands by use count, highest first; ties keep creation order.
    pub fn most_used_commands(&self, guild_id: &str, limit: usize) -> Vec<CustomCommandRecord> {
        let mut ranked: Vec<_> = self
            .commands
            .lock()
            .get(guild_id)
            .map(|commands| {
                commands
                    .iter()
                    .filter(|command| command.enabled)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        ranked.sort_by(|a, b| b.uses.cmp(&a.uses));
        ranked.truncate(limit);
        ranked
    }
}
