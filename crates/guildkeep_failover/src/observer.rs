//! Transition notifications.

use crate::{BackendChannel, BackendMode};
use serde::Serialize;

/// One applied mode change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeTransition {
    /// Channel that changed
    pub channel: BackendChannel,
    /// Previous mode
    pub from: BackendMode,
    /// New mode
    pub to: BackendMode,
    /// What triggered the change
    pub cause: String,
}

/// Receives every applied transition. Observers cannot veto or alter state.
pub trait FailoverObserver: Send + Sync {
    /// Called after the transition is applied.
    fn on_transition(&self, transition: &ModeTransition);
}

/// Hook run whenever the entity channel enters volatile mode.
///
/// Implementations must be idempotent; the hook fires on every entry.
pub trait VolatileActivation: Send + Sync {
    /// Prepare the in-process store to serve requests.
    fn activate(&self);
}

/// Logs transitions through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FailoverObserver for TracingObserver {
    fn on_transition(&self, transition: &ModeTransition) {
        match transition.to {
            BackendMode::Volatile => tracing::warn!(
                channel = %transition.channel,
                cause = %transition.cause,
                "Durable backend unavailable, serving from memory"
            ),
            BackendMode::Durable => tracing::info!(
                channel = %transition.channel,
                cause = %transition.cause,
                "Durable backend restored"
            ),
        }
    }
}
