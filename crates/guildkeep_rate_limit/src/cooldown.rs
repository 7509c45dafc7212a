//! Per-command cooldowns.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CooldownKey {
    command: String,
    subject: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    at: Instant,
    until: Instant,
}

type Stamps = Arc<Mutex<HashMap<CooldownKey, Stamp>>>;

/// Longest cooldown a stamp can hold. Longer requests are clamped to it.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Tracks when each subject last used each command.
///
/// A stamp blocks further use of the same command by the same subject until
/// its cooldown ends. When a Tokio runtime is available the stamp is also
/// removed once the cooldown has passed, so idle entries do not pile up;
/// [`sweep`](Self::sweep) covers stamps created outside a runtime.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    stamps: Stamps,
}

impl CooldownTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `subject` may use `command`, stamping the use if so.
    ///
    /// Returns [`Duration::ZERO`] when the use is allowed. Otherwise returns
    /// the time left on the cooldown and leaves the existing stamp as is.
    /// A zero `cooldown` always allows and records nothing; one longer than
    /// [`MAX_COOLDOWN`] is clamped.
    #[instrument(skip(self), fields(cooldown_ms = cooldown.as_millis() as u64))]
    pub fn check_and_stamp(&self, command: &str, subject: &str, cooldown: Duration) -> Duration {
        if cooldown.is_zero() {
            return Duration::ZERO;
        }
        let cooldown = cooldown.min(MAX_COOLDOWN);

        let now = Instant::now();
        let key = CooldownKey {
            command: command.to_string(),
            subject: subject.to_string(),
        };

        let stamp = {
            let mut stamps = self.stamps.lock();
            if let Some(stamp) = stamps.get(&key)
                && now < stamp.until
            {
                let remaining = stamp.until - now;
                debug!(remaining_ms = remaining.as_millis() as u64, "On cooldown");
                return remaining;
            }
            let stamp = Stamp {
                at: now,
                until: now + cooldown,
            };
            stamps.insert(key.clone(), stamp);
            stamp
        };

        self.schedule_removal(key, stamp, cooldown);
        Duration::ZERO
    }

    /// Time left before `subject` may use `command` again.
    pub fn remaining(&self, command: &str, subject: &str) -> Duration {
        let now = Instant::now();
        let key = CooldownKey {
            command: command.to_string(),
            subject: subject.to_string(),
        };
        self.stamps
            .lock()
            .get(&key)
            .map(|stamp| stamp.until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Clear the cooldown for `subject` on `command`.
    pub fn reset(&self, command: &str, subject: &str) {
        let key = CooldownKey {
            command: command.to_string(),
            subject: subject.to_string(),
        };
        self.stamps.lock().remove(&key);
    }

    /// Drop every stamp whose cooldown has ended. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut stamps = self.stamps.lock();
        let before = stamps.len();
        stamps.retain(|_, stamp| now < stamp.until);
        before - stamps.len()
    }

    /// Number of stored stamps.
    pub fn len(&self) -> usize {
        self.stamps.lock().len()
    }

    /// Whether no stamps are stored.
    pub fn is_empty(&self) -> bool {
        self.stamps.lock().is_empty()
    }

    fn schedule_removal(&self, key: CooldownKey, stamp: Stamp, cooldown: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let stamps = Arc::downgrade(&self.stamps);
        handle.spawn(async move {
            tokio::time::sleep(cooldown).await;
            let Some(stamps) = stamps.upgrade() else {
                return;
            };
            let mut stamps = stamps.lock();
            // A later use may have restamped the key after a reset.
            if stamps.get(&key) == Some(&stamp) {
                stamps.remove(&key);
            }
        });
    }
}
