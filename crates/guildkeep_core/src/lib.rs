//! Core entity types for the Guildkeep persistence library.
//!
//! This crate defines the five entity collections every backend stores
//! (guilds, users, analytics events, moderation cases and custom commands),
//! the inputs used to create them, and the patches used to update them.
//!
//! Inputs validate themselves before any backend is touched; patches apply
//! as a shallow merge, replacing nested objects whole.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analytics;
mod custom_command;
mod guild;
mod moderation;
mod user;
mod validate;

pub use analytics::{
    ANALYTICS_CAP, ANALYTICS_RETENTION_DAYS, AnalyticsEvent, AnalyticsQuery, AnalyticsSummary,
    AnalyticsType, NewAnalyticsEvent, retention_cutoff,
};
pub use custom_command::{
    CommandConditions, CommandEmbed, CommandResponse, CustomCommandPatch, CustomCommandRecord,
    EmbedField, MAX_COOLDOWN_SECS, MAX_DESCRIPTION_LEN, NewCustomCommand, NewCustomCommandBuilder,
    ResponseType, TriggerType,
};
pub use guild::{
    AutoModSettings, FeatureFlags, GuildPatch, GuildRecord, GuildSettings, Language,
    LoggingSettings, ModerationSettings, NewGuild, PremiumStatus, PremiumTier,
};
pub use moderation::{
    AppealStatus, CaseMetadata, CasePatch, MAX_APPEAL_LEN, MAX_REASON_LEN, ModerationAction,
    ModerationCase, NewModerationCase, NewModerationCaseBuilder,
};
pub use user::{
    GuildGrant, GuildRole, NewUser, UserPatch, UserPermissions, UserPreferences, UserRecord,
};
