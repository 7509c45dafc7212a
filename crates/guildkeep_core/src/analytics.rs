//! Analytics event log.

use crate::validate;
use chrono::{DateTime, Duration, Utc};
use guildkeep_error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Maximum number of events retained per guild; the oldest are dropped first.
pub const ANALYTICS_CAP: usize = 10_000;

/// Events older than this many days are eligible for removal.
pub const ANALYTICS_RETENTION_DAYS: i64 = 90;

const DEFAULT_QUERY_LIMIT: usize = 100;

/// Oldest timestamp still inside the retention window at `now`.
pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(ANALYTICS_RETENTION_DAYS)
}

/// Kinds of tracked guild activity.
///
/// # Examples
///
/// ```
/// use guildkeep_core::AnalyticsType;
/// use std::str::FromStr;
///
/// assert_eq!(AnalyticsType::MemberJoin.to_string(), "member_join");
/// assert_eq!(AnalyticsType::from_str("role_update").unwrap(), AnalyticsType::RoleUpdate);
/// ```
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalyticsType {
    /// Message sent
    Message,
    /// Voice activity
    Voice,
    /// Member joined
    MemberJoin,
    /// Member left
    MemberLeave,
    /// Command invoked
    Command,
    /// Reaction added
    Reaction,
    /// Channel created
    ChannelCreate,
    /// Channel deleted
    ChannelDelete,
    /// Role changed
    RoleUpdate,
}

/// One appended analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Owning guild
    pub guild_id: String,
    /// Event type
    #[serde(rename = "type")]
    pub kind: AnalyticsType,
    /// When the activity happened
    pub timestamp: DateTime<Utc>,
    /// Free-form payload
    pub data: JsonValue,
    /// Acting user
    pub user_id: Option<String>,
    /// Channel involved
    pub channel_id: Option<String>,
    /// When the event was stored
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// Whether the event falls outside the retention window at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.timestamp < retention_cutoff(now)
    }
}

/// Input for appending an analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct NewAnalyticsEvent {
    /// Owning guild
    #[setters(skip)]
    pub guild_id: String,
    /// Event type
    #[setters(skip)]
    pub kind: AnalyticsType,
    /// Free-form payload; must be a JSON object
    #[setters(skip)]
    pub data: JsonValue,
    /// Acting user
    pub user_id: Option<String>,
    /// Channel involved
    pub channel_id: Option<String>,
    /// Activity time; defaults to the append time
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewAnalyticsEvent {
    /// Create an event input with a JSON object payload.
    pub fn new(guild_id: impl Into<String>, kind: AnalyticsType, data: JsonValue) -> Self {
        Self {
            guild_id: guild_id.into(),
            kind,
            data,
            user_id: None,
            channel_id: None,
            timestamp: None,
        }
    }

    /// Reject a missing guild or a non-object payload.
    pub fn validate(&self) -> StoreResult<()> {
        validate::require("guild_id", &self.guild_id)?;
        if !self.data.is_object() {
            return Err(StoreError::validation("data must be a JSON object"));
        }
        Ok(())
    }

    /// Materialize the event at `now`.
    pub fn into_event(self, now: DateTime<Utc>) -> AnalyticsEvent {
        AnalyticsEvent {
            guild_id: self.guild_id,
            kind: self.kind,
            timestamp: self.timestamp.unwrap_or(now),
            data: self.data,
            user_id: self.user_id,
            channel_id: self.channel_id,
            created_at: now,
        }
    }
}

/// Filter for listing a guild's events, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    /// Only events of this type
    pub kind: Option<AnalyticsType>,
    /// Maximum number of events returned
    pub limit: usize,
}

impl AnalyticsQuery {
    /// Restrict to one event type.
    pub fn of_kind(kind: AnalyticsType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Override the limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether `event` passes the type filter.
    pub fn matches(&self, event: &AnalyticsEvent) -> bool {
        self.kind.is_none_or(|kind| event.kind == kind)
    }
}

impl Default for AnalyticsQuery {
    fn default() -> Self {
        Self {
            kind: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

/// Event counts over a time range.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use guildkeep_core::{AnalyticsSummary, AnalyticsType, NewAnalyticsEvent};
/// use serde_json::json;
///
/// let now = Utc::now();
/// let events = vec![
///     NewAnalyticsEvent::new("g1", AnalyticsType::Message, json!({})).into_event(now),
///     NewAnalyticsEvent::new("g1", AnalyticsType::MemberJoin, json!({})).into_event(now),
/// ];
///
/// let summary = AnalyticsSummary::from_events(events.iter());
/// assert_eq!(summary.total_events, 2);
/// assert_eq!(summary.message_count(), 1);
/// assert_eq!(summary.member_leaves(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Number of events in range
    pub total_events: u64,
    /// Events per type
    pub counts: BTreeMap<AnalyticsType, u64>,
}

impl AnalyticsSummary {
    /// Tally the given events.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a AnalyticsEvent>) -> Self {
        let mut summary = Self::default();
        for event in events {
            summary.total_events += 1;
            *summary.counts.entry(event.kind).or_insert(0) += 1;
        }
        summary
    }

    /// Events of `kind`.
    pub fn count(&self, kind: AnalyticsType) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Message events.
    pub fn message_count(&self) -> u64 {
        self.count(AnalyticsType::Message)
    }

    /// Member join events.
    pub fn member_joins(&self) -> u64 {
        self.count(AnalyticsType::MemberJoin)
    }

    /// Member leave events.
    pub fn member_leaves(&self) -> u64 {
        self.count(AnalyticsType::MemberLeave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_payload() {
        let event = NewAnalyticsEvent::new("g1", AnalyticsType::Voice, json!(42));
        assert!(event.validate().is_err());
    }

    #[test]
    fn expiry_follows_retention_window() {
        let now = Utc::now();
        let old = NewAnalyticsEvent::new("g1", AnalyticsType::Message, json!({}))
            .with_timestamp(now - Duration::days(ANALYTICS_RETENTION_DAYS + 1))
            .into_event(now);
        let fresh = NewAnalyticsEvent::new("g1", AnalyticsType::Message, json!({})).into_event(now);

        assert!(old.is_expired(now));
        assert!(!fresh.is_expired(now));
    }

    #[test]
    fn type_serializes_snake_case() {
        let value = serde_json::to_value(AnalyticsType::ChannelDelete).unwrap();
        assert_eq!(value, json!("channel_delete"));
    }
}
