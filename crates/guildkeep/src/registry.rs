//! Explicit command registration and dispatch.

use async_trait::async_trait;
use guildkeep_core::CustomCommandRecord;
use guildkeep_database::StoreAdapter;
use guildkeep_error::GuildkeepResult;
use guildkeep_rate_limit::{LimitScope, RateGovernor};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Invocation details handed to a command.
#[derive(Debug, Clone, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct CommandContext {
    /// Guild the command was invoked in
    guild_id: String,
    /// Invoking user
    user_id: String,
    /// Arguments after the command name
    #[builder(default)]
    args: Vec<String>,
    /// Storage façade
    store: StoreAdapter,
}

impl CommandContext {
    /// Context for `user_id` in `guild_id`.
    pub fn new(guild_id: String, user_id: String, args: Vec<String>, store: StoreAdapter) -> Self {
        Self {
            guild_id,
            user_id,
            args,
            store,
        }
    }
}

/// A built-in command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the command is invoked by.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str;

    /// Per-user cooldown, if any.
    fn cooldown(&self) -> Option<Duration> {
        None
    }

    /// Run the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    async fn execute(&self, context: &CommandContext) -> GuildkeepResult<JsonValue>;
}

/// Name and description of a registered command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, derive_getters::Getters)]
pub struct CommandInfo {
    name: String,
    description: String,
    cooldown: Option<Duration>,
}

/// Result of routing one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A built-in command ran and produced this output
    Executed(JsonValue),
    /// A guild's custom command matched; its use has been recorded
    Custom(CustomCommandRecord),
    /// The user exceeded the command rate limit
    RateLimited {
        /// When the user's window ends
        reset_at: Option<Instant>,
    },
    /// The user must wait this long before using the command again
    Cooldown(Duration),
    /// Nothing answers to the name
    Unknown,
}

/// Built-in commands keyed by name.
///
/// Commands are added with [`register`](Self::register) at startup; nothing
/// is discovered at runtime.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, replacing any command with the same name.
    #[instrument(skip(self, command), fields(command = command.name()))]
    pub fn register(&mut self, command: Arc<dyn CommandHandler>) {
        let name = command.name().to_string();
        if self.commands.contains_key(&name) {
            warn!(command = %name, "Command already registered, overwriting previous registration");
        } else {
            debug!("Registering command");
        }
        self.commands.insert(name, command);
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.get(name).cloned()
    }

    /// Every registered command, sorted by name.
    pub fn list(&self) -> Vec<CommandInfo> {
        self.commands
            .values()
            .map(|command| CommandInfo {
                name: command.name().to_string(),
                description: command.description().to_string(),
                cooldown: command.cooldown(),
            })
            .collect()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Route an invocation of `name`.
    ///
    /// The user's command rate limit is checked first. A registered command
    /// then has its cooldown enforced and runs. Otherwise the guild's enabled
    /// custom command for `name` is looked up, subject to its own cooldown,
    /// and its use counted.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or a storage call is rejected.
    #[instrument(
        skip(self, governor, context),
        fields(guild_id = %context.guild_id, user_id = %context.user_id)
    )]
    pub async fn dispatch(
        &self,
        governor: &RateGovernor,
        context: &CommandContext,
        name: &str,
    ) -> GuildkeepResult<Dispatch> {
        if governor.is_limited(LimitScope::Command, &context.user_id) {
            return Ok(Dispatch::RateLimited {
                reset_at: governor.reset_at(LimitScope::Command, &context.user_id),
            });
        }

        if let Some(command) = self.get(name) {
            if let Some(cooldown) = command.cooldown() {
                let wait = governor.check_and_stamp(name, &context.user_id, cooldown);
                if !wait.is_zero() {
                    return Ok(Dispatch::Cooldown(wait));
                }
            }
            info!(command = name, "Executing command");
            return command.execute(context).await.map(Dispatch::Executed);
        }

        let store = &context.store;
        let Some(custom) = store.find_custom_command(&context.guild_id, name).await? else {
            debug!(command = name, "No command found");
            return Ok(Dispatch::Unknown);
        };

        let key = format!("{}/{}", custom.guild_id, custom.trigger_key());
        let wait = governor.check_and_stamp(&key, &context.user_id, custom.cooldown());
        if !wait.is_zero() {
            return Ok(Dispatch::Cooldown(wait));
        }

        let used = store
            .record_command_use(&context.guild_id, name)
            .await?
            .unwrap_or(custom);
        info!(command = %used.name, uses = used.uses, "Custom command matched");
        Ok(Dispatch::Custom(used))
    }
}
