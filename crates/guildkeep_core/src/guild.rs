//! Guild configuration records.

use crate::validate;
use chrono::{DateTime, Utc};
use guildkeep_error::StoreResult;
use serde::{Deserialize, Serialize};

/// Interface language of a guild or user.
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
pub enum Language {
    /// German
    #[default]
    De,
    /// English
    En,
}

/// Feature toggles for a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Automatic moderation
    pub auto_mod: bool,
    /// Analytics collection
    pub analytics: bool,
    /// Custom commands
    pub custom_commands: bool,
    /// Welcome messages for new members
    pub welcome_messages: bool,
    /// Audit log forwarding
    pub audit_log: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auto_mod: false,
            analytics: true,
            custom_commands: false,
            welcome_messages: false,
            audit_log: true,
        }
    }
}

/// Automatic moderation switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoModSettings {
    /// Master switch
    pub enabled: bool,
    /// Spam detection
    pub spam_protection: bool,
    /// Profanity filter
    pub profanity_filter: bool,
    /// Link filter
    pub link_filter: bool,
    /// Raid detection
    pub raid_protection: bool,
}

/// Moderation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationSettings {
    /// Role applied to muted members
    pub muted_role: Option<String>,
    /// Channel receiving moderation case notices
    pub mod_log_channel: Option<String>,
    /// Automatic moderation switches
    pub auto_mod: AutoModSettings,
}

/// Which guild events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Deleted messages
    pub message_delete: bool,
    /// Edited messages
    pub message_edit: bool,
    /// Member joins
    pub member_join: bool,
    /// Member departures
    pub member_leave: bool,
    /// Role changes
    pub role_changes: bool,
    /// Channel changes
    pub channel_changes: bool,
    /// Destination channel
    pub log_channel: Option<String>,
}

/// Per-guild settings.
///
/// Updates replace this object whole; there is no deep merge.
///
/// # Examples
///
/// ```
/// use guildkeep_core::{GuildSettings, Language};
///
/// let settings = GuildSettings::default();
/// assert_eq!(settings.prefix, "!");
/// assert_eq!(settings.language, Language::De);
/// assert!(settings.features.analytics);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    /// Text command prefix
    pub prefix: String,
    /// Interface language
    pub language: Language,
    /// IANA timezone name
    pub timezone: String,
    /// Feature toggles
    pub features: FeatureFlags,
    /// Moderation configuration
    pub moderation: ModerationSettings,
    /// Event logging configuration
    pub logging: LoggingSettings,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            language: Language::default(),
            timezone: "Europe/Berlin".to_string(),
            features: FeatureFlags::default(),
            moderation: ModerationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Subscription tier.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PremiumTier {
    /// No subscription
    #[default]
    Free,
    /// Basic tier
    Basic,
    /// Premium tier
    Premium,
    /// Enterprise tier
    Enterprise,
}

/// Premium subscription state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumStatus {
    /// Whether the subscription is active
    pub active: bool,
    /// Subscription tier
    pub tier: PremiumTier,
    /// Expiry, if any
    pub expires_at: Option<DateTime<Utc>>,
    /// Unlocked feature names
    pub features: Vec<String>,
}

/// A guild known to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRecord {
    /// Platform guild ID (unique)
    pub guild_id: String,
    /// Display name
    pub name: String,
    /// Icon hash
    pub icon: Option<String>,
    /// Owner's user ID
    pub owner_id: String,
    /// Configuration
    pub settings: GuildSettings,
    /// Subscription state
    pub premium: PremiumStatus,
    /// `false` marks soft deletion
    pub active: bool,
    /// When the application joined the guild
    pub joined_at: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a guild.
///
/// # Examples
///
/// ```
/// use guildkeep_core::NewGuild;
///
/// let guild = NewGuild::new("g1", "Test", "u1");
/// assert!(guild.validate().is_ok());
///
/// let nameless = NewGuild::new("g1", "  ", "u1");
/// assert!(nameless.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct NewGuild {
    /// Platform guild ID
    #[setters(skip)]
    pub guild_id: String,
    /// Display name
    #[setters(into)]
    pub name: String,
    /// Owner's user ID
    #[setters(into)]
    pub owner_id: String,
    /// Icon hash
    #[setters(strip_option, into)]
    pub icon: Option<String>,
    /// Initial settings
    pub settings: GuildSettings,
    /// Initial subscription state
    pub premium: PremiumStatus,
}

impl NewGuild {
    /// Create input with default settings.
    pub fn new(
        guild_id: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            icon: None,
            settings: GuildSettings::default(),
            premium: PremiumStatus::default(),
        }
    }

    /// Reject missing required fields.
    pub fn validate(&self) -> StoreResult<()> {
        validate::require("guild_id", &self.guild_id)?;
        validate::require("name", &self.name)?;
        validate::require("owner_id", &self.owner_id)?;
        validate::require("settings.prefix", &self.settings.prefix)
    }

    /// Materialize the record at `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> GuildRecord {
        GuildRecord {
            guild_id: self.guild_id,
            name: self.name,
            icon: self.icon,
            owner_id: self.owner_id,
            settings: self.settings,
            premium: self.premium,
            active: true,
            joined_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a guild. Unset fields are left untouched.
///
/// # Examples
///
/// ```
/// use guildkeep_core::GuildPatch;
///
/// let patch = GuildPatch::default().with_name("Renamed");
/// assert_eq!(patch.name.as_deref(), Some("Renamed"));
/// assert_eq!(GuildPatch::deactivate().active, Some(false));
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct GuildPatch {
    /// New display name
    pub name: Option<String>,
    /// New icon (`Some(None)` clears it)
    pub icon: Option<Option<String>>,
    /// New owner
    pub owner_id: Option<String>,
    /// Replacement settings
    pub settings: Option<GuildSettings>,
    /// Replacement subscription state
    pub premium: Option<PremiumStatus>,
    /// Soft-deletion flag
    pub active: Option<bool>,
}

impl GuildPatch {
    /// Patch that soft-deletes the guild.
    pub fn deactivate() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    /// Reject values that would break a required field.
    pub fn validate(&self) -> StoreResult<()> {
        validate::optional("name", self.name.as_deref())?;
        validate::optional("owner_id", self.owner_id.as_deref())?;
        if let Some(settings) = &self.settings {
            validate::require("settings.prefix", &settings.prefix)?;
        }
        Ok(())
    }

    /// Shallow-merge into `record` and refresh `updated_at`.
    pub fn apply(self, record: &mut GuildRecord, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(icon) = self.icon {
            record.icon = icon;
        }
        if let Some(owner_id) = self.owner_id {
            record.owner_id = owner_id;
        }
        if let Some(settings) = self.settings {
            record.settings = settings;
        }
        if let Some(premium) = self.premium {
            record.premium = premium;
        }
        if let Some(active) = self.active {
            record.active = active;
        }
        record.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_replaces_nested_settings_whole() {
        let now = Utc::now();
        let mut record = NewGuild::new("g1", "Test", "u1").into_record(now);
        record.settings.moderation.muted_role = Some("muted".to_string());

        let mut settings = GuildSettings::default();
        settings.prefix = "?".to_string();
        GuildPatch::default().with_settings(settings).apply(&mut record, now);

        assert_eq!(record.settings.prefix, "?");
        assert_eq!(record.settings.moderation.muted_role, None);
    }

    #[test]
    fn patch_leaves_unset_fields() {
        let created = Utc::now();
        let mut record = NewGuild::new("g1", "Test", "u1").into_record(created);
        let later = created + chrono::Duration::seconds(5);

        GuildPatch::default().with_icon(Some("abc".to_string())).apply(&mut record, later);

        assert_eq!(record.name, "Test");
        assert_eq!(record.icon.as_deref(), Some("abc"));
        assert_eq!(record.updated_at, later);
        assert_eq!(record.created_at, created);
    }

    #[test]
    fn patch_rejects_blank_name() {
        assert!(GuildPatch::default().with_name("").validate().is_err());
    }
}
