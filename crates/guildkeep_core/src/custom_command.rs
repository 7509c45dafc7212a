//! Guild-defined custom commands.

use crate::validate;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use guildkeep_error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Longest allowed cooldown, in seconds (24 hours).
pub const MAX_COOLDOWN_SECS: u32 = 86_400;

/// Longest allowed description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// How a command's trigger is matched.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriggerType {
    /// Plain text prefix command
    #[default]
    Text,
    /// Regular expression
    Regex,
    /// Slash command
    Slash,
}

/// What a command does when triggered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseType {
    /// Reply in channel
    Text,
    /// Reply with an embed
    Embed,
    /// React to the message
    Reaction,
    /// Direct-message the caller
    Dm,
    /// Toggle a role on the caller
    Role,
}

/// One embed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field title
    pub name: String,
    /// Field body
    pub value: String,
    /// Render inline
    #[serde(default)]
    pub inline: bool,
}

/// Embed template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEmbed {
    /// Title line
    pub title: Option<String>,
    /// Body text
    pub description: Option<String>,
    /// Hex color
    pub color: Option<String>,
    /// Fields in display order
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    /// Footer text
    pub footer: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Image URL
    pub image: Option<String>,
}

/// Response definition. Which fields matter depends on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Response type
    #[serde(rename = "type")]
    pub kind: ResponseType,
    /// Text for `Text` and `Dm`
    pub content: Option<String>,
    /// Embed for `Embed`
    pub embed: Option<CommandEmbed>,
    /// Emoji for `Reaction`
    #[serde(default)]
    pub reactions: Vec<String>,
    /// Role for `Role`
    pub role_id: Option<String>,
}

impl CommandResponse {
    fn empty(kind: ResponseType) -> Self {
        Self {
            kind,
            content: None,
            embed: None,
            reactions: Vec::new(),
            role_id: None,
        }
    }

    /// Reply with `content`.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::empty(ResponseType::Text)
        }
    }

    /// Direct-message `content`.
    pub fn dm(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::empty(ResponseType::Dm)
        }
    }

    /// Reply with `embed`.
    pub fn embed(embed: CommandEmbed) -> Self {
        Self {
            embed: Some(embed),
            ..Self::empty(ResponseType::Embed)
        }
    }

    /// React with each of `reactions`.
    pub fn reaction<I, S>(reactions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reactions: reactions.into_iter().map(Into::into).collect(),
            ..Self::empty(ResponseType::Reaction)
        }
    }

    /// Toggle `role_id`.
    pub fn role(role_id: impl Into<String>) -> Self {
        Self {
            role_id: Some(role_id.into()),
            ..Self::empty(ResponseType::Role)
        }
    }

    /// Reject a response missing the payload its type needs.
    pub fn validate(&self) -> StoreResult<()> {
        match self.kind {
            ResponseType::Text | ResponseType::Dm => {
                validate::optional("response.content", self.content.as_deref())?;
                if self.content.is_none() {
                    return Err(StoreError::validation(format!(
                        "{} response requires content",
                        self.kind
                    )));
                }
            }
            ResponseType::Embed if self.embed.is_none() => {
                return Err(StoreError::validation("embed response requires an embed"));
            }
            ResponseType::Reaction if self.reactions.is_empty() => {
                return Err(StoreError::validation(
                    "reaction response requires at least one reaction",
                ));
            }
            ResponseType::Role => {
                validate::optional("response.role_id", self.role_id.as_deref())?;
                if self.role_id.is_none() {
                    return Err(StoreError::validation("role response requires a role_id"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Who may run a command and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConditions {
    /// Caller must hold one of these roles
    #[serde(default)]
    pub required_roles: Vec<String>,
    /// Caller must hold these permissions
    #[serde(default)]
    pub required_permissions: Vec<String>,
    /// Only these channels, when non-empty
    #[serde(default)]
    pub allowed_channels: Vec<String>,
    /// Never these channels
    #[serde(default)]
    pub denied_channels: Vec<String>,
    /// Minimum member level
    pub required_level: Option<u32>,
}

/// A stored custom command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommandRecord {
    /// Owning guild
    pub guild_id: String,
    /// Display name, lowercase
    pub name: String,
    /// Help text
    pub description: String,
    /// Trigger as entered; matched case-insensitively
    pub trigger: String,
    /// Trigger matching mode
    pub trigger_type: TriggerType,
    /// Response definition
    pub response: CommandResponse,
    /// Run conditions
    pub conditions: CommandConditions,
    /// Template variables
    pub variables: BTreeMap<String, String>,
    /// Per-user cooldown in seconds
    pub cooldown_secs: u32,
    /// Disabled commands are invisible to lookups
    pub enabled: bool,
    /// Invocation count
    pub uses: u64,
    /// Last invocation
    pub last_used: Option<DateTime<Utc>>,
    /// Creator's user ID
    pub created_by: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl CustomCommandRecord {
    /// Whether `trigger` names this command, ignoring case.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use guildkeep_core::{CommandResponse, NewCustomCommandBuilder};
    ///
    /// let command = NewCustomCommandBuilder::default()
    ///     .guild_id("g1")
    ///     .name("greet")
    ///     .trigger("Hello")
    ///     .response(CommandResponse::text("hi!"))
    ///     .created_by("u1")
    ///     .build()
    ///     .unwrap()
    ///     .into_record(Utc::now());
    ///
    /// assert!(command.matches_trigger("hello"));
    /// assert!(command.matches_trigger("HELLO"));
    /// assert!(!command.matches_trigger("hell"));
    /// ```
    pub fn matches_trigger(&self, trigger: &str) -> bool {
        fold(&self.trigger) == fold(trigger)
    }

    /// Folded trigger used for uniqueness checks.
    pub fn trigger_key(&self) -> String {
        fold(&self.trigger)
    }

    /// Whether `query` appears in the name, description or trigger, ignoring case.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = fold(query);
        [&self.name, &self.description, &self.trigger]
            .iter()
            .any(|field| fold(field).contains(&query))
    }

    /// Cooldown as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(u64::from(self.cooldown_secs))
    }

    /// Count one invocation at `now`.
    pub fn record_use(&mut self, now: DateTime<Utc>) {
        self.uses += 1;
        self.last_used = Some(now);
        self.updated_at = now;
    }
}

/// Case-folded form used for trigger comparison.
pub(crate) fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Input for creating a custom command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct NewCustomCommand {
    /// Owning guild
    guild_id: String,
    /// Display name
    name: String,
    /// Help text
    #[builder(default)]
    description: String,
    /// Trigger
    trigger: String,
    /// Trigger matching mode
    #[builder(default)]
    trigger_type: TriggerType,
    /// Response definition
    response: CommandResponse,
    /// Run conditions
    #[builder(default)]
    conditions: CommandConditions,
    /// Template variables
    #[builder(default)]
    variables: BTreeMap<String, String>,
    /// Per-user cooldown in seconds
    #[builder(default)]
    cooldown_secs: u32,
    /// Creator's user ID
    created_by: String,
}

impl NewCustomCommandBuilder {
    /// Build and validate the command input.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is missing or any
    /// value is out of range.
    pub fn build(&self) -> StoreResult<NewCustomCommand> {
        let command = self
            .build_internal()
            .map_err(|e| StoreError::validation(e.to_string()))?;
        command.validate()?;
        Ok(command)
    }
}

impl NewCustomCommand {
    /// Reject missing fields, oversized text and out-of-range cooldowns.
    pub fn validate(&self) -> StoreResult<()> {
        validate::require("guild_id", &self.guild_id)?;
        validate::require("name", &self.name)?;
        validate::require("trigger", &self.trigger)?;
        validate::require("created_by", &self.created_by)?;
        validate::max_chars("description", &self.description, MAX_DESCRIPTION_LEN)?;
        check_cooldown(self.cooldown_secs)?;
        self.response.validate()
    }

    /// Folded trigger used for uniqueness checks.
    pub fn trigger_key(&self) -> String {
        fold(&self.trigger)
    }

    /// Materialize the record at `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> CustomCommandRecord {
        CustomCommandRecord {
            guild_id: self.guild_id,
            name: fold(&self.name),
            description: self.description,
            trigger: self.trigger,
            trigger_type: self.trigger_type,
            response: self.response,
            conditions: self.conditions,
            variables: self.variables,
            cooldown_secs: self.cooldown_secs,
            enabled: true,
            uses: 0,
            last_used: None,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

fn check_cooldown(cooldown_secs: u32) -> StoreResult<()> {
    if cooldown_secs > MAX_COOLDOWN_SECS {
        return Err(StoreError::validation(format!(
            "cooldown exceeds {} seconds (got {})",
            MAX_COOLDOWN_SECS, cooldown_secs
        )));
    }
    Ok(())
}

/// Partial update for a custom command. The trigger is fixed at creation.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct CustomCommandPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New matching mode
    pub trigger_type: Option<TriggerType>,
    /// Replacement response
    pub response: Option<CommandResponse>,
    /// Replacement conditions
    pub conditions: Option<CommandConditions>,
    /// Replacement variables
    pub variables: Option<BTreeMap<String, String>>,
    /// New cooldown
    pub cooldown_secs: Option<u32>,
    /// Enabled flag
    pub enabled: Option<bool>,
}

impl CustomCommandPatch {
    /// Patch that disables the command.
    pub fn disable() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }

    /// Reject out-of-range replacements.
    pub fn validate(&self) -> StoreResult<()> {
        validate::optional("name", self.name.as_deref())?;
        if let Some(description) = &self.description {
            validate::max_chars("description", description, MAX_DESCRIPTION_LEN)?;
        }
        if let Some(cooldown_secs) = self.cooldown_secs {
            check_cooldown(cooldown_secs)?;
        }
        if let Some(response) = &self.response {
            response.validate()?;
        }
        Ok(())
    }

    /// Shallow-merge into `record` and refresh `updated_at`.
    pub fn apply(self, record: &mut CustomCommandRecord, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            record.name = fold(&name);
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(trigger_type) = self.trigger_type {
            record.trigger_type = trigger_type;
        }
        if let Some(response) = self.response {
            record.response = response;
        }
        if let Some(conditions) = self.conditions {
            record.conditions = conditions;
        }
        if let Some(variables) = self.variables {
            record.variables = variables;
        }
        if let Some(cooldown_secs) = self.cooldown_secs {
            record.cooldown_secs = cooldown_secs;
        }
        if let Some(enabled) = self.enabled {
            record.enabled = enabled;
        }
        record.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> NewCustomCommandBuilder {
        let mut builder = NewCustomCommandBuilder::default();
        builder
            .guild_id("g1")
            .name("Rules")
            .trigger("!Rules")
            .response(CommandResponse::text("Be nice."))
            .created_by("u1");
        builder
    }

    #[test]
    fn cooldown_is_capped() {
        assert!(builder().cooldown_secs(MAX_COOLDOWN_SECS).build().is_ok());
        assert!(builder().cooldown_secs(MAX_COOLDOWN_SECS + 1).build().is_err());
    }

    #[test]
    fn description_is_capped() {
        let err = builder()
            .description("d".repeat(MAX_DESCRIPTION_LEN + 1))
            .build()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn response_must_carry_its_payload() {
        let mut response = CommandResponse::text("x");
        response.kind = ResponseType::Role;
        assert!(builder().response(response).build().is_err());
        assert!(
            builder()
                .response(CommandResponse::reaction(Vec::<String>::new()))
                .build()
                .is_err()
        );
        assert!(builder().response(CommandResponse::role("r1")).build().is_ok());
    }

    #[test]
    fn name_is_stored_lowercase() {
        let record = builder().build().unwrap().into_record(Utc::now());
        assert_eq!(record.name, "rules");
        assert_eq!(record.trigger, "!Rules");
    }

    #[test]
    fn query_matches_any_text_field() {
        let record = builder()
            .description("Server RULES summary")
            .build()
            .unwrap()
            .into_record(Utc::now());
        assert!(record.matches_query("summary"));
        assert!(record.matches_query("!ru"));
        assert!(!record.matches_query("faq"));
    }

    #[test]
    fn record_use_counts_invocations() {
        let mut record = builder().build().unwrap().into_record(Utc::now());
        let now = Utc::now();
        record.record_use(now);
        record.record_use(now);
        assert_eq!(record.uses, 2);
        assert_eq!(record.last_used, Some(now));
    }
}
