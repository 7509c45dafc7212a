//! Per-channel failover state machine.

use crate::{BackendChannel, BackendMode, FailoverObserver, ModeTransition, VolatileActivation};
use guildkeep_error::BackendError;
use guildkeep_interface::ConnectivityEvent;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, instrument};

#[derive(Debug, Default)]
struct ChannelState {
    volatile: AtomicBool,
    transitions: AtomicU64,
    last_cause: Mutex<Option<String>>,
}

impl ChannelState {
    fn mode(&self) -> BackendMode {
        if self.volatile.load(Ordering::Acquire) {
            BackendMode::Volatile
        } else {
            BackendMode::Durable
        }
    }

    /// Flip to `to`, returning `false` if already there.
    fn transition(&self, to: BackendMode, cause: &str) -> bool {
        let target = to == BackendMode::Volatile;
        let changed = self
            .volatile
            .compare_exchange(!target, target, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.transitions.fetch_add(1, Ordering::Relaxed);
            *self.last_cause.lock() = Some(cause.to_string());
        }
        changed
    }

    fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            mode: self.mode(),
            transitions: self.transitions.load(Ordering::Relaxed),
            last_cause: self.last_cause.lock().clone(),
        }
    }
}

/// Point-in-time view of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    /// Current mode
    pub mode: BackendMode,
    /// Applied transitions since startup
    pub transitions: u64,
    /// Cause of the most recent transition
    pub last_cause: Option<String>,
}

/// Point-in-time view of both channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailoverSnapshot {
    /// Entity channel
    pub entity: ChannelSnapshot,
    /// Cache channel
    pub cache: ChannelSnapshot,
}

/// Tracks whether each channel is served by its durable backend.
///
/// Both channels start [`BackendMode::Durable`]. Only connection-level
/// events move them: an error or disconnect enters volatile mode, a
/// reconnect leaves it. Repeated events in the same direction are no-ops.
#[derive(Default)]
pub struct FailoverController {
    entity: ChannelState,
    cache: ChannelState,
    observers: RwLock<Vec<Arc<dyn FailoverObserver>>>,
    activations: RwLock<Vec<Arc<dyn VolatileActivation>>>,
}

impl std::fmt::Debug for FailoverController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverController")
            .field("entity", &self.entity.mode())
            .field("cache", &self.cache.mode())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

impl FailoverController {
    /// Controller with both channels durable and no observers.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, channel: BackendChannel) -> &ChannelState {
        match channel {
            BackendChannel::Entity => &self.entity,
            BackendChannel::Cache => &self.cache,
        }
    }

    /// Register a transition observer.
    pub fn add_observer(&self, observer: Arc<dyn FailoverObserver>) {
        self.observers.write().push(observer);
    }

    /// Register a hook run on every entry into entity volatile mode.
    ///
    /// If the entity channel is already volatile the hook runs immediately.
    pub fn add_activation(&self, activation: Arc<dyn VolatileActivation>) {
        if self.entity.mode() == BackendMode::Volatile {
            activation.activate();
        }
        self.activations.write().push(activation);
    }

    /// Current mode of `channel`.
    pub fn mode(&self, channel: BackendChannel) -> BackendMode {
        self.state(channel).mode()
    }

    /// Whether `channel` should be routed to its durable backend.
    pub fn is_durable(&self, channel: BackendChannel) -> bool {
        self.mode(channel) == BackendMode::Durable
    }

    /// Apply a driver event to `channel`.
    #[instrument(skip_all, fields(channel = %channel, event = %event))]
    pub fn handle_event(&self, channel: BackendChannel, event: &ConnectivityEvent) {
        match event {
            ConnectivityEvent::Error(cause) => self.enter(channel, BackendMode::Volatile, cause),
            ConnectivityEvent::Disconnected => {
                self.enter(channel, BackendMode::Volatile, "disconnected")
            }
            ConnectivityEvent::Reconnected => {
                self.enter(channel, BackendMode::Durable, "reconnected")
            }
        }
    }

    /// Record a connectivity failure observed during an operation.
    pub fn report_failure(&self, channel: BackendChannel, error: &BackendError) {
        self.handle_event(channel, &ConnectivityEvent::Error(error.to_string()));
    }

    /// Put `channel` into volatile mode without a driver event.
    ///
    /// Used when no durable backend is configured or the initial connection
    /// could not be opened.
    pub fn force_volatile(&self, channel: BackendChannel, reason: &str) {
        self.enter(channel, BackendMode::Volatile, reason);
    }

    fn enter(&self, channel: BackendChannel, to: BackendMode, cause: &str) {
        let state = self.state(channel);
        let from = state.mode();
        if !state.transition(to, cause) {
            debug!(channel = %channel, mode = %to, "Already in requested mode");
            return;
        }

        if channel == BackendChannel::Entity && to == BackendMode::Volatile {
            for activation in self.activations.read().iter() {
                activation.activate();
            }
        }

        let transition = ModeTransition {
            channel,
            from,
            to,
            cause: cause.to_string(),
        };
        for observer in self.observers.read().iter() {
            observer.on_transition(&transition);
        }
    }

    /// Modes and transition counts for both channels.
    pub fn snapshot(&self) -> FailoverSnapshot {
        FailoverSnapshot {
            entity: self.entity.snapshot(),
            cache: self.cache.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ModeTransition>>);

    impl FailoverObserver for Recorder {
        fn on_transition(&self, transition: &ModeTransition) {
            self.0.lock().push(transition.clone());
        }
    }

    #[derive(Default)]
    struct Counter(AtomicU64);

    impl VolatileActivation for Counter {
        fn activate(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn repeated_events_notify_once() {
        let controller = FailoverController::new();
        let recorder = Arc::new(Recorder::default());
        controller.add_observer(recorder.clone());

        controller.handle_event(BackendChannel::Cache, &ConnectivityEvent::Disconnected);
        controller.handle_event(
            BackendChannel::Cache,
            &ConnectivityEvent::Error("timeout".into()),
        );

        let seen = recorder.0.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].from, BackendMode::Durable);
        assert_eq!(seen[0].to, BackendMode::Volatile);
        assert_eq!(seen[0].cause, "disconnected");
    }

    #[test]
    fn activation_runs_only_for_entity_channel() {
        let controller = FailoverController::new();
        let counter = Arc::new(Counter::default());
        controller.add_activation(counter.clone());

        controller.force_volatile(BackendChannel::Cache, "no cache url");
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        controller.force_volatile(BackendChannel::Entity, "no entity url");
        controller.force_volatile(BackendChannel::Entity, "no entity url");
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_activation_runs_when_already_volatile() {
        let controller = FailoverController::new();
        controller.force_volatile(BackendChannel::Entity, "placeholder");

        let counter = Arc::new(Counter::default());
        controller.add_activation(counter.clone());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_counts_transitions() {
        let controller = FailoverController::new();
        controller.handle_event(BackendChannel::Entity, &ConnectivityEvent::Disconnected);
        controller.handle_event(BackendChannel::Entity, &ConnectivityEvent::Reconnected);
        controller.handle_event(BackendChannel::Entity, &ConnectivityEvent::Reconnected);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.entity.mode, BackendMode::Durable);
        assert_eq!(snapshot.entity.transitions, 2);
        assert_eq!(snapshot.entity.last_cause.as_deref(), Some("reconnected"));
        assert_eq!(snapshot.cache.transitions, 0);
    }
}
