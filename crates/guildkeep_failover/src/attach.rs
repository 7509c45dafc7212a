//! Attaching durable drivers to the controller.

use crate::{BackendChannel, FailoverController};
use guildkeep_interface::{ConnectivityEvent, DurableConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, instrument, warn};

/// Startup connection retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Total connection attempts before giving up
    pub attempts: usize,
    /// Initial backoff between attempts
    pub backoff: Duration,
    /// Upper bound on any single backoff
    pub max_delay: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl ConnectPolicy {
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        let millis = u64::try_from(self.backoff.as_millis()).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(millis)
            .factor(2)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.attempts.saturating_sub(1))
    }
}

impl FailoverController {
    /// Connect a durable driver to `channel` and follow its events.
    ///
    /// The connection is retried per `policy`; if every attempt fails the
    /// channel enters volatile mode. Either way a listener task is spawned
    /// that applies the driver's connectivity events until the driver drops
    /// its event sender, so a later reconnect still restores the channel.
    /// Events emitted before a successful connect are discarded.
    #[instrument(skip(self, connection), fields(channel = %channel, attempts = policy.attempts))]
    pub async fn attach(
        self: &Arc<Self>,
        channel: BackendChannel,
        connection: Arc<dyn DurableConnection>,
        policy: ConnectPolicy,
    ) -> JoinHandle<()> {
        let mut events = connection.events();

        let connected = Retry::spawn(policy.strategy(), || {
            let connection = connection.clone();
            async move {
                connection.connect().await.map_err(|err| {
                    if err.is_connectivity() {
                        warn!(error = %err, "Durable connection failed, will retry");
                        RetryError::Transient {
                            err,
                            retry_after: None,
                        }
                    } else {
                        RetryError::Permanent(err)
                    }
                })
            }
        })
        .await;

        match connected {
            Ok(()) => {
                // Errors reported by refused attempts predate the connection.
                events = events.resubscribe();
                info!(channel = %channel, "Durable backend connected");
            }
            Err(err) => self.force_volatile(channel, &err.to_string()),
        }

        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.follow(channel, events).await })
    }

    async fn follow(
        &self,
        channel: BackendChannel,
        mut events: tokio::sync::broadcast::Receiver<ConnectivityEvent>,
    ) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(channel, &event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(channel = %channel, skipped, "Missed connectivity events");
                }
                Err(RecvError::Closed) => {
                    debug!(channel = %channel, "Driver event stream closed");
                    break;
                }
            }
        }
    }
}
