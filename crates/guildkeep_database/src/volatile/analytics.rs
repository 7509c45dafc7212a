use super::VolatileStore;
use chrono::{DateTime, Utc};
use guildkeep_core::{
    ANALYTICS_CAP, AnalyticsEvent, AnalyticsQuery, AnalyticsSummary, NewAnalyticsEvent,
    retention_cutoff,
};
use tracing::debug;

impl VolatileStore {
    /// Append an event, dropping the guild's oldest events beyond the cap.
    pub fn append_event(&self, event: NewAnalyticsEvent) -> AnalyticsEvent {
        let event = event.into_event(Utc::now());
        let mut analytics = self.analytics.lock();
        let log = analytics.entry(event.guild_id.clone()).or_default();
        log.push_back(event.clone());
        let overflow = log.len().saturating_sub(ANALYTICS_CAP);
        if overflow > 0 {
            log.drain(..overflow);
            debug!(guild_id = %event.guild_id, dropped = overflow, "Analytics cap reached");
        }
        event
    }

    /// A guild's events inside the retention window, newest first.
    pub fn list_events(&self, guild_id: &str, query: &AnalyticsQuery) -> Vec<AnalyticsEvent> {
        let cutoff = retention_cutoff(Utc::now());
        let mut events: Vec<_> = self
            .analytics
            .lock()
            .get(guild_id)
            .map(|log| {
                log.iter()
                    .filter(|event| event.timestamp >= cutoff && query.matches(event))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        // Stable sort keeps later appends ahead of earlier ones on equal timestamps.
        events.reverse();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(query.limit);
        events
    }

    /// Count a guild's retained events with `since <= timestamp <= until`.
    pub fn summarize_events(
        &self,
        guild_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AnalyticsSummary {
        let since = since.max(retention_cutoff(Utc::now()));
        let analytics = self.analytics.lock();
        match analytics.get(guild_id) {
            Some(log) => AnalyticsSummary::from_events(
                log.iter()
                    .filter(|event| event.timestamp >= since && event.timestamp <= until),
            ),
            None => AnalyticsSummary::default(),
        }
    }

    /// Remove events older than `before` across all guilds.
    pub fn prune_events(&self, before: DateTime<Utc>) -> u64 {
        let mut analytics = self.analytics.lock();
        let mut removed = 0u64;
        for log in analytics.values_mut() {
            let len = log.len();
            log.retain(|event| event.timestamp >= before);
            removed += (len - log.len()) as u64;
        }
        analytics.retain(|_, log| !log.is_empty());
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use guildkeep_core::{ANALYTICS_RETENTION_DAYS, AnalyticsType};
    use serde_json::json;

    fn event(kind: AnalyticsType) -> NewAnalyticsEvent {
        NewAnalyticsEvent::new("g1", kind, json!({}))
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let store = VolatileStore::new();
        let now = Utc::now();
        for minutes in [30, 10, 20] {
            store.append_event(
                event(AnalyticsType::Message).with_timestamp(now - Duration::minutes(minutes)),
            );
        }

        let events = store.list_events("g1", &AnalyticsQuery::default().with_limit(2));
        let ages: Vec<_> = events
            .iter()
            .map(|event| (now - event.timestamp).num_minutes())
            .collect();
        assert_eq!(ages, vec![10, 20]);
    }

    #[test]
    fn reads_hide_expired_events_until_pruned() {
        let store = VolatileStore::new();
        let stale = Utc::now() - Duration::days(ANALYTICS_RETENTION_DAYS + 1);
        store.append_event(event(AnalyticsType::Voice).with_timestamp(stale));
        store.append_event(event(AnalyticsType::Voice));

        assert_eq!(store.list_events("g1", &AnalyticsQuery::default()).len(), 1);
        assert_eq!(store.stats().analytics_events, 2);

        let removed = store.prune_events(retention_cutoff(Utc::now()));
        assert_eq!(removed, 1);
        assert_eq!(store.stats().analytics_events, 1);
    }

    #[test]
    fn summary_respects_range() {
        let store = VolatileStore::new();
        let now = Utc::now();
        store.append_event(event(AnalyticsType::Message).with_timestamp(now - Duration::hours(2)));
        store.append_event(event(AnalyticsType::Message));
        store.append_event(event(AnalyticsType::MemberLeave));

        let summary = store.summarize_events("g1", now - Duration::hours(1), Utc::now());
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.message_count(), 1);
        assert_eq!(summary.member_leaves(), 1);

        let empty = store.summarize_events("g2", now - Duration::hours(1), Utc::now());
        assert_eq!(empty.total_events, 0);
    }
}
