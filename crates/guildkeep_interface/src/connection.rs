//! Connection lifecycle reported by durable drivers.

use async_trait::async_trait;
use guildkeep_error::BackendError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Connection-level event emitted by a durable driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectivityEvent {
    /// The connection reported an error
    Error(String),
    /// The connection dropped
    Disconnected,
    /// The connection came back
    Reconnected,
}

/// A durable backend's connection handle.
///
/// Drivers reconnect on their own and announce it through [`events`]; the
/// failover controller only listens.
///
/// [`events`]: DurableConnection::events
#[async_trait]
pub trait DurableConnection: Send + Sync {
    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn connect(&self) -> Result<(), BackendError>;

    /// Subscribe to connectivity events.
    fn events(&self) -> broadcast::Receiver<ConnectivityEvent>;
}
