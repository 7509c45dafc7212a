//! Whole-store export and import.

use super::VolatileStore;
use guildkeep_core::{
    ANALYTICS_CAP, AnalyticsEvent, CustomCommandRecord, GuildRecord, ModerationCase, UserRecord,
};
use guildkeep_error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{info, instrument};

/// Record counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatileStats {
    /// Whether failover has relied on the store
    pub active: bool,
    /// Stored guilds
    pub guilds: usize,
    /// Stored users
    pub users: usize,
    /// Stored analytics events across guilds
    pub analytics_events: usize,
    /// Stored moderation cases across guilds
    pub moderation_cases: usize,
    /// Stored custom commands across guilds
    pub custom_commands: usize,
}

/// Serializable copy of every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatileSnapshot {
    /// Guilds
    pub guilds: Vec<GuildRecord>,
    /// Users
    pub users: Vec<UserRecord>,
    /// Analytics events in append order
    pub analytics: Vec<AnalyticsEvent>,
    /// Moderation cases
    pub cases: Vec<ModerationCase>,
    /// Custom commands in creation order
    pub commands: Vec<CustomCommandRecord>,
}

impl VolatileStore {
    /// Copy out every record.
    pub fn export(&self) -> VolatileSnapshot {
        let mut guilds: Vec<_> = self.guilds.lock().values().cloned().collect();
        guilds.sort_by(|a, b| a.guild_id.cmp(&b.guild_id));
        let mut users: Vec<_> = self.users.lock().values().cloned().collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        VolatileSnapshot {
            guilds,
            users,
            analytics: self
                .analytics
                .lock()
                .values()
                .flat_map(|log| log.iter().cloned())
                .collect(),
            cases: self
                .cases
                .lock()
                .values()
                .flat_map(|log| log.iter().cloned())
                .collect(),
            commands: self
                .commands
                .lock()
                .values()
                .flat_map(|commands| commands.iter().cloned())
                .collect(),
        }
    }

    /// Replace every collection with the snapshot's contents.
    ///
    /// The snapshot is checked before anything is replaced: a repeated guild
    /// ID, user ID, case ID within a guild, or trigger within a guild (ignoring
    /// case) rejects the whole import and leaves the store unchanged. The
    /// analytics cap is re-applied per guild and cases are ordered by case ID.
    ///
    /// # Errors
    ///
    /// Returns a conflict naming the first repeated key.
    #[instrument(skip_all, fields(guilds = snapshot.guilds.len(), users = snapshot.users.len()))]
    pub fn import(&self, snapshot: VolatileSnapshot) -> StoreResult<()> {
        let mut guilds = HashMap::new();
        for guild in snapshot.guilds {
            if guilds.contains_key(&guild.guild_id) {
                return Err(StoreError::conflict("guild", guild.guild_id));
            }
            guilds.insert(guild.guild_id.clone(), guild);
        }

        let mut users = HashMap::new();
        for user in snapshot.users {
            if users.contains_key(&user.user_id) {
                return Err(StoreError::conflict("user", user.user_id));
            }
            users.insert(user.user_id.clone(), user);
        }

        let mut cases: HashMap<String, Vec<ModerationCase>> = HashMap::new();
        let mut case_keys = HashSet::new();
        for case in snapshot.cases {
            if !case_keys.insert((case.guild_id.clone(), case.case_id)) {
                return Err(StoreError::conflict(
                    "moderation case",
                    format!("{}#{}", case.guild_id, case.case_id),
                ));
            }
            cases.entry(case.guild_id.clone()).or_default().push(case);
        }
        for log in cases.values_mut() {
            log.sort_by_key(|case| case.case_id);
        }

        let mut commands: HashMap<String, Vec<CustomCommandRecord>> = HashMap::new();
        let mut triggers = HashSet::new();
        for command in snapshot.commands {
            if !triggers.insert((command.guild_id.clone(), command.trigger_key())) {
                return Err(StoreError::conflict(
                    "custom command",
                    format!("{}/{}", command.guild_id, command.trigger),
                ));
            }
            commands
                .entry(command.guild_id.clone())
                .or_default()
                .push(command);
        }

        let mut analytics: HashMap<String, VecDeque<AnalyticsEvent>> = HashMap::new();
        for event in snapshot.analytics {
            let log = analytics.entry(event.guild_id.clone()).or_default();
            log.push_back(event);
            if log.len() > ANALYTICS_CAP {
                log.pop_front();
            }
        }

        *self.guilds.lock() = guilds;
        *self.users.lock() = users;
        *self.analytics.lock() = analytics;
        *self.cases.lock() = cases;
        *self.commands.lock() = commands;

        info!(stats = ?self.stats(), "Volatile store imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildkeep_core::{
        AnalyticsType, CommandResponse, ModerationAction, NewAnalyticsEvent,
        NewCustomCommandBuilder, NewGuild, NewModerationCaseBuilder, NewUser,
    };
    use serde_json::json;

    fn populated() -> VolatileStore {
        let store = VolatileStore::new();
        store.create_guild(NewGuild::new("g1", "Guild", "o")).unwrap();
        store.create_user(NewUser::new("u1", "alice", "0001")).unwrap();
        store.append_event(NewAnalyticsEvent::new("g1", AnalyticsType::Command, json!({})));
        store.create_case(
            NewModerationCaseBuilder::default()
                .guild_id("g1")
                .user_id("u1")
                .username("alice")
                .moderator_id("m1")
                .moderator_name("mod")
                .action(ModerationAction::Warn)
                .reason("spam")
                .build()
                .unwrap(),
        );
        store
            .create_command(
                NewCustomCommandBuilder::default()
                    .guild_id("g1")
                    .name("ping")
                    .trigger("!ping")
                    .response(CommandResponse::text("pong"))
                    .created_by("u1")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        store
    }

    #[test]
    fn export_then_import_restores_counts() {
        let source = populated();
        let json = serde_json::to_string(&source.export()).unwrap();

        let target = VolatileStore::new();
        target.import(serde_json::from_str(&json).unwrap()).unwrap();

        let stats = target.stats();
        assert_eq!(stats.guilds, 1);
        assert_eq!(stats.users, 1);
        assert_eq!(stats.analytics_events, 1);
        assert_eq!(stats.moderation_cases, 1);
        assert_eq!(stats.custom_commands, 1);
        assert!(!stats.active);
    }

    #[test]
    fn imported_cases_continue_numbering() {
        let target = VolatileStore::new();
        target.import(populated().export()).unwrap();

        let next = target.create_case(
            NewModerationCaseBuilder::default()
                .guild_id("g1")
                .user_id("u2")
                .username("bob")
                .moderator_id("m1")
                .moderator_name("mod")
                .action(ModerationAction::Kick)
                .reason("raid")
                .build()
                .unwrap(),
        );
        assert_eq!(next.case_id, 2);
    }

    #[test]
    fn import_rejects_repeated_keys_and_keeps_store() {
        let target = populated();
        let before = target.export();

        let mut snapshot = before.clone();
        let mut shouting = snapshot.commands[0].clone();
        shouting.trigger = "!PING".into();
        snapshot.commands.push(shouting);
        assert!(target.import(snapshot).unwrap_err().is_conflict());

        let mut snapshot = before.clone();
        snapshot.guilds.push(snapshot.guilds[0].clone());
        assert!(target.import(snapshot).unwrap_err().is_conflict());

        let mut snapshot = before.clone();
        snapshot.cases.push(snapshot.cases[0].clone());
        assert!(target.import(snapshot).unwrap_err().is_conflict());

        assert_eq!(target.export(), before);
    }

    #[test]
    fn same_trigger_in_other_guilds_imports() {
        let mut snapshot = populated().export();
        let mut elsewhere = snapshot.commands[0].clone();
        elsewhere.guild_id = "g2".into();
        snapshot.commands.push(elsewhere);

        let target = VolatileStore::new();
        target.import(snapshot).unwrap();
        assert_eq!(target.stats().custom_commands, 2);
    }

    #[test]
    fn clear_keeps_activation() {
        let store = populated();
        store.activate();
        store.clear();
        assert_eq!(
            store.stats(),
            VolatileStats {
                active: true,
                ..VolatileStats::default()
            }
        );
    }
}
