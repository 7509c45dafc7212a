use super::{StoreAdapter, require_key};
use chrono::{DateTime, Utc};
use guildkeep_core::{AnalyticsEvent, AnalyticsQuery, AnalyticsSummary, NewAnalyticsEvent};
use guildkeep_error::{StoreError, StoreResult};
use guildkeep_interface::AnalyticsRepository;
use tracing::{debug, instrument};

impl StoreAdapter {
    /// Append an analytics event.
    #[instrument(skip(self, event), fields(guild_id = %event.guild_id, kind = %event.kind))]
    pub async fn track_event(&self, event: NewAnalyticsEvent) -> StoreResult<AnalyticsEvent> {
        event.validate()?;
        route!(self, "track_event", |repo| repo.append_event(&event), || Ok(
            self.volatile.append_event(event)
        ))
    }

    /// A guild's retained events, newest first.
    #[instrument(skip(self))]
    pub async fn list_analytics(
        &self,
        guild_id: &str,
        query: AnalyticsQuery,
    ) -> StoreResult<Vec<AnalyticsEvent>> {
        require_key("guild_id", guild_id)?;
        route!(self, "list_analytics", |repo| repo.list_events(guild_id, &query), || Ok(
            self.volatile.list_events(guild_id, &query)
        ))
    }

    /// Per-type event counts for `since <= timestamp <= until`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `since` is after `until`.
    #[instrument(skip(self))]
    pub async fn analytics_summary(
        &self,
        guild_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<AnalyticsSummary> {
        require_key("guild_id", guild_id)?;
        if since > until {
            return Err(StoreError::validation("summary range starts after it ends"));
        }
        route!(
            self,
            "analytics_summary",
            |repo| repo.summarize_events(guild_id, since, until),
            || Ok(self.volatile.summarize_events(guild_id, since, until))
        )
    }

    /// Remove events older than `before` from memory and, when reachable,
    /// from the durable backend. Returns the total removed.
    #[instrument(skip(self))]
    pub async fn prune_analytics(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let mut removed = self.volatile.prune_events(before);
        if let Some(repo) = self.durable() {
            if let Some(Ok(durable)) = self.settle("prune_analytics", repo.prune_events(before).await) {
                removed += durable;
            }
        }
        debug!(removed, "Pruned analytics");
        Ok(removed)
    }
}
