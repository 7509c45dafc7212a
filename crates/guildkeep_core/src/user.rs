//! User profile records.

use crate::{Language, validate};
use chrono::{DateTime, Utc};
use guildkeep_error::StoreResult;
use serde::{Deserialize, Serialize};

/// A user's role within one guild's dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum GuildRole {
    /// Guild owner
    Owner,
    /// Administrator
    Admin,
    /// Moderator
    Moderator,
    /// Read-only access
    Viewer,
}

/// Access grant for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildGrant {
    /// Guild the grant applies to
    pub guild_id: String,
    /// Granted role
    pub role: GuildRole,
}

/// Permission grants held by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    /// Developers can access every guild
    pub is_developer: bool,
    /// Support staff flag
    pub is_support: bool,
    /// Per-guild grants
    pub guilds: Vec<GuildGrant>,
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Interface language
    pub language: Language,
    /// IANA timezone name
    pub timezone: String,
    /// Opt-in for email notifications
    pub email_notifications: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            language: Language::default(),
            timezone: "Europe/Berlin".to_string(),
            email_notifications: true,
        }
    }
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Platform user ID (unique)
    pub user_id: String,
    /// Username
    pub username: String,
    /// Legacy discriminator
    pub discriminator: String,
    /// Avatar hash
    pub avatar: Option<String>,
    /// Email address, stored lowercase
    pub email: Option<String>,
    /// Permission grants
    pub permissions: UserPermissions,
    /// Preferences
    pub preferences: UserPreferences,
    /// `false` marks soft deletion
    pub active: bool,
    /// Last login time
    pub last_login: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Whether the user may access `guild_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use guildkeep_core::{GuildGrant, GuildRole, NewUser};
    ///
    /// let mut user = NewUser::new("u1", "alice", "0001").into_record(Utc::now());
    /// assert!(!user.has_guild_access("g1"));
    ///
    /// user.permissions.guilds.push(GuildGrant { guild_id: "g1".into(), role: GuildRole::Admin });
    /// assert!(user.has_guild_access("g1"));
    /// assert_eq!(user.guild_role("g1"), Some(GuildRole::Admin));
    /// ```
    pub fn has_guild_access(&self, guild_id: &str) -> bool {
        self.permissions.is_developer || self.guild_role(guild_id).is_some()
    }

    /// The user's role in `guild_id`, if any.
    pub fn guild_role(&self, guild_id: &str) -> Option<GuildRole> {
        self.permissions
            .guilds
            .iter()
            .find(|grant| grant.guild_id == guild_id)
            .map(|grant| grant.role)
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct NewUser {
    /// Platform user ID
    #[setters(skip)]
    pub user_id: String,
    /// Username
    #[setters(into)]
    pub username: String,
    /// Legacy discriminator
    #[setters(into)]
    pub discriminator: String,
    /// Avatar hash
    #[setters(strip_option, into)]
    pub avatar: Option<String>,
    /// Email address
    #[setters(strip_option, into)]
    pub email: Option<String>,
    /// Initial grants
    pub permissions: UserPermissions,
    /// Initial preferences
    pub preferences: UserPreferences,
}

impl NewUser {
    /// Create input with default permissions and preferences.
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            discriminator: discriminator.into(),
            avatar: None,
            email: None,
            permissions: UserPermissions::default(),
            preferences: UserPreferences::default(),
        }
    }

    /// Reject missing required fields.
    pub fn validate(&self) -> StoreResult<()> {
        validate::require("user_id", &self.user_id)?;
        validate::require("username", &self.username)?;
        validate::require("discriminator", &self.discriminator)?;
        validate::optional("email", self.email.as_deref())?;
        for grant in &self.permissions.guilds {
            validate::require("permissions.guilds.guild_id", &grant.guild_id)?;
        }
        Ok(())
    }

    /// Materialize the record at `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> UserRecord {
        UserRecord {
            user_id: self.user_id,
            username: self.username,
            discriminator: self.discriminator,
            avatar: self.avatar,
            email: self.email.map(|email| email.to_lowercase()),
            permissions: self.permissions,
            preferences: self.preferences,
            active: true,
            last_login: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a user. Unset fields are left untouched.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct UserPatch {
    /// New username
    pub username: Option<String>,
    /// New discriminator
    pub discriminator: Option<String>,
    /// New avatar (`Some(None)` clears it)
    pub avatar: Option<Option<String>>,
    /// New email (`Some(None)` clears it)
    pub email: Option<Option<String>>,
    /// Replacement grants
    pub permissions: Option<UserPermissions>,
    /// Replacement preferences
    pub preferences: Option<UserPreferences>,
    /// Soft-deletion flag
    pub active: Option<bool>,
    /// Login timestamp
    pub last_login: Option<DateTime<Utc>>,
}

impl UserPatch {
    /// Patch that soft-deletes the user.
    pub fn deactivate() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    /// Patch recording a login at `at`.
    pub fn login(at: DateTime<Utc>) -> Self {
        Self {
            last_login: Some(at),
            ..Self::default()
        }
    }

    /// Reject values that would break a required field.
    pub fn validate(&self) -> StoreResult<()> {
        validate::optional("username", self.username.as_deref())?;
        validate::optional("discriminator", self.discriminator.as_deref())?;
        if let Some(permissions) = &self.permissions {
            for grant in &permissions.guilds {
                validate::require("permissions.guilds.guild_id", &grant.guild_id)?;
            }
        }
        Ok(())
    }

    /// Shallow-merge into `record` and refresh `updated_at`.
    pub fn apply(self, record: &mut UserRecord, now: DateTime<Utc>) {
        if let Some(username) = self.username {
            record.username = username;
        }
        if let Some(discriminator) = self.discriminator {
            record.discriminator = discriminator;
        }
        if let Some(avatar) = self.avatar {
            record.avatar = avatar;
        }
        if let Some(email) = self.email {
            record.email = email.map(|email| email.to_lowercase());
        }
        if let Some(permissions) = self.permissions {
            record.permissions = permissions;
        }
        if let Some(preferences) = self.preferences {
            record.preferences = preferences;
        }
        if let Some(active) = self.active {
            record.active = active;
        }
        if let Some(last_login) = self.last_login {
            record.last_login = last_login;
        }
        record.updated_at = now;
    }
}
