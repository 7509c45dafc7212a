//! Moderation case log.

use crate::validate;
use chrono::{DateTime, Duration, Utc};
use derive_getters::Getters;
use guildkeep_error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Maximum length of a case reason, in characters.
pub const MAX_REASON_LEN: usize = 1000;

/// Maximum length of an appeal message, in characters.
pub const MAX_APPEAL_LEN: usize = 2000;

/// Action taken against a member.
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
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModerationAction {
    /// Warning
    Warn,
    /// Kick
    Kick,
    /// Ban
    Ban,
    /// Ban reversal
    Unban,
    /// Mute
    Mute,
    /// Mute reversal
    Unmute,
    /// Timeout
    Timeout,
}

/// Appeal progress for a case.
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
pub enum AppealStatus {
    /// No appeal filed
    #[default]
    None,
    /// Awaiting review
    Pending,
    /// Appeal granted
    Approved,
    /// Appeal denied
    Rejected,
}

/// Extra context recorded with a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// Messages purged alongside the action
    pub deleted_messages: Option<u32>,
    /// Warnings the member had before this case
    pub previous_warnings: Option<u32>,
    /// Raised by automod rather than a moderator
    pub auto_mod: bool,
}

/// One moderation case. Cases are never physically removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationCase {
    /// Owning guild
    pub guild_id: String,
    /// Per-guild sequence number starting at 1
    pub case_id: u64,
    /// Targeted member
    pub user_id: String,
    /// Targeted member's name at the time
    pub username: String,
    /// Acting moderator
    pub moderator_id: String,
    /// Acting moderator's name at the time
    pub moderator_name: String,
    /// Action taken
    pub action: ModerationAction,
    /// Stated reason
    pub reason: String,
    /// Length of a temporary action
    pub duration_secs: Option<u64>,
    /// When a temporary action lapses
    pub expires_at: Option<DateTime<Utc>>,
    /// `false` once expired or reversed
    pub active: bool,
    /// Appeal progress
    pub appeal_status: AppealStatus,
    /// Member's appeal text
    pub appeal_message: Option<String>,
    /// Reviewer of the appeal
    pub appeal_reviewed_by: Option<String>,
    /// When the appeal was reviewed
    pub appeal_reviewed_at: Option<DateTime<Utc>>,
    /// Extra context
    pub metadata: CaseMetadata,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl ModerationCase {
    /// Whether a temporary action has lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether this is a warning that still counts against the member.
    pub fn is_active_warning(&self, now: DateTime<Utc>) -> bool {
        self.action == ModerationAction::Warn && self.active && !self.is_expired(now)
    }
}

/// Input for opening a case. The case ID is allocated by the store.
///
/// # Examples
///
/// ```
/// use guildkeep_core::{ModerationAction, NewModerationCaseBuilder};
///
/// let case = NewModerationCaseBuilder::default()
///     .guild_id("g1")
///     .user_id("u1")
///     .username("alice")
///     .moderator_id("m1")
///     .moderator_name("mod")
///     .action(ModerationAction::Timeout)
///     .reason("spam")
///     .duration_secs(600u64)
///     .build()
///     .unwrap();
///
/// assert_eq!(case.duration_secs(), &Some(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct NewModerationCase {
    /// Owning guild
    guild_id: String,
    /// Targeted member
    user_id: String,
    /// Targeted member's name
    username: String,
    /// Acting moderator
    moderator_id: String,
    /// Acting moderator's name
    moderator_name: String,
    /// Action taken
    action: ModerationAction,
    /// Stated reason
    reason: String,
    /// Length of a temporary action
    #[builder(default, setter(strip_option))]
    duration_secs: Option<u64>,
    /// Extra context
    #[builder(default)]
    metadata: CaseMetadata,
}

impl NewModerationCaseBuilder {
    /// Build and validate the case input.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is missing or the
    /// reason is blank or too long.
    pub fn build(&self) -> StoreResult<NewModerationCase> {
        let case = self
            .build_internal()
            .map_err(|e| StoreError::validation(e.to_string()))?;
        case.validate()?;
        Ok(case)
    }
}

impl NewModerationCase {
    /// Reject missing identities and out-of-range reasons.
    pub fn validate(&self) -> StoreResult<()> {
        validate::require("guild_id", &self.guild_id)?;
        validate::require("user_id", &self.user_id)?;
        validate::require("username", &self.username)?;
        validate::require("moderator_id", &self.moderator_id)?;
        validate::require("moderator_name", &self.moderator_name)?;
        validate::require("reason", &self.reason)?;
        validate::max_chars("reason", &self.reason, MAX_REASON_LEN)
    }

    /// Materialize the case with its allocated `case_id` at `now`.
    pub fn into_case(self, case_id: u64, now: DateTime<Utc>) -> ModerationCase {
        let expires_at = self
            .duration_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| now + Duration::seconds(secs));
        ModerationCase {
            guild_id: self.guild_id,
            case_id,
            user_id: self.user_id,
            username: self.username,
            moderator_id: self.moderator_id,
            moderator_name: self.moderator_name,
            action: self.action,
            reason: self.reason,
            duration_secs: self.duration_secs,
            expires_at,
            active: true,
            appeal_status: AppealStatus::None,
            appeal_message: None,
            appeal_reviewed_by: None,
            appeal_reviewed_at: None,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a case.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct CasePatch {
    /// Amended reason
    pub reason: Option<String>,
    /// Active flag
    pub active: Option<bool>,
    /// Appeal progress
    pub appeal_status: Option<AppealStatus>,
    /// Appeal text
    pub appeal_message: Option<String>,
    /// Reviewer; stamps `appeal_reviewed_at`
    pub appeal_reviewed_by: Option<String>,
}

impl CasePatch {
    /// Patch that deactivates the case.
    pub fn deactivate() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    /// Reject a blank or oversized reason and oversized appeal text.
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(reason) = &self.reason {
            validate::require("reason", reason)?;
            validate::max_chars("reason", reason, MAX_REASON_LEN)?;
        }
        if let Some(message) = &self.appeal_message {
            validate::max_chars("appeal_message", message, MAX_APPEAL_LEN)?;
        }
        Ok(())
    }

    /// Shallow-merge into `case` and refresh `updated_at`.
    pub fn apply(self, case: &mut ModerationCase, now: DateTime<Utc>) {
        if let Some(reason) = self.reason {
            case.reason = reason;
        }
        if let Some(active) = self.active {
            case.active = active;
        }
        if let Some(status) = self.appeal_status {
            case.appeal_status = status;
        }
        if let Some(message) = self.appeal_message {
            case.appeal_message = Some(message);
        }
        if let Some(reviewer) = self.appeal_reviewed_by {
            case.appeal_reviewed_by = Some(reviewer);
            case.appeal_reviewed_at = Some(now);
        }
        case.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> NewModerationCaseBuilder {
        let mut builder = NewModerationCaseBuilder::default();
        builder
            .guild_id("g1")
            .user_id("u1")
            .username("alice")
            .moderator_id("m1")
            .moderator_name("mod")
            .action(ModerationAction::Warn);
        builder
    }

    #[test]
    fn reason_length_is_bounded() {
        assert!(builder().reason("x".repeat(MAX_REASON_LEN)).build().is_ok());

        let err = builder()
            .reason("x".repeat(MAX_REASON_LEN + 1))
            .build()
            .unwrap_err();
        assert!(err.is_validation());

        assert!(builder().reason("  ").build().is_err());
    }

    #[test]
    fn missing_field_is_a_validation_error() {
        let err = NewModerationCaseBuilder::default()
            .guild_id("g1")
            .reason("spam")
            .build()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn duration_sets_expiry() {
        let now = Utc::now();
        let case = builder()
            .reason("spam")
            .duration_secs(60u64)
            .build()
            .unwrap()
            .into_case(1, now);

        assert_eq!(case.expires_at, Some(now + Duration::seconds(60)));
        assert!(case.is_active_warning(now));
        assert!(!case.is_active_warning(now + Duration::seconds(60)));
    }

    #[test]
    fn reviewer_stamps_review_time() {
        let now = Utc::now();
        let mut case = builder().reason("spam").build().unwrap().into_case(1, now);
        let later = now + Duration::minutes(5);

        CasePatch::default()
            .with_appeal_status(AppealStatus::Approved)
            .with_appeal_reviewed_by("m2")
            .apply(&mut case, later);

        assert_eq!(case.appeal_status, AppealStatus::Approved);
        assert_eq!(case.appeal_reviewed_at, Some(later));
        assert_eq!(case.updated_at, later);
    }
}
