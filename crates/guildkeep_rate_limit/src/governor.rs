//! Scoped limiters plus cooldowns behind one handle.

use crate::{CooldownTracker, LimiterConfig, RateLimitConfig, SlidingWindowLimiter};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Which limiter a check applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LimitScope {
    /// Per-command invocations
    Command,
    /// All requests from a user
    Global,
    /// Sensitive operations
    Strict,
}

/// Entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Ended windows removed across all limiters
    pub windows: usize,
    /// Ended cooldown stamps removed
    pub cooldowns: usize,
}

/// One limiter per [`LimitScope`] and a shared [`CooldownTracker`].
///
/// # Example
///
/// ```
/// use guildkeep_rate_limit::{LimitScope, RateGovernor};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let governor = RateGovernor::default();
/// assert!(!governor.is_limited(LimitScope::Command, "user-1"));
///
/// let wait = governor.check_and_stamp("ping", "user-1", Duration::from_secs(5));
/// assert!(wait.is_zero());
/// assert!(!governor.check_and_stamp("ping", "user-1", Duration::from_secs(5)).is_zero());
/// # });
/// ```
#[derive(Debug)]
pub struct RateGovernor {
    command: SlidingWindowLimiter,
    global: SlidingWindowLimiter,
    strict: SlidingWindowLimiter,
    cooldowns: CooldownTracker,
    sweep_interval: Duration,
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}

impl RateGovernor {
    /// Build limiters from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        debug!(?config, "Creating rate governor");
        Self {
            command: SlidingWindowLimiter::new(config.command),
            global: SlidingWindowLimiter::new(config.global),
            strict: SlidingWindowLimiter::new(config.strict),
            cooldowns: CooldownTracker::new(),
            sweep_interval: config.sweep_interval(),
        }
    }

    /// Limiter for `scope`.
    pub fn limiter(&self, scope: LimitScope) -> &SlidingWindowLimiter {
        match scope {
            LimitScope::Command => &self.command,
            LimitScope::Global => &self.global,
            LimitScope::Strict => &self.strict,
        }
    }

    /// Settings of the limiter for `scope`.
    pub fn limits(&self, scope: LimitScope) -> &LimiterConfig {
        self.limiter(scope).config()
    }

    /// Count a request and report whether it must be refused.
    pub fn is_limited(&self, scope: LimitScope, subject: &str) -> bool {
        self.limiter(scope).is_limited(subject)
    }

    /// Requests left in `subject`'s current window.
    pub fn remaining(&self, scope: LimitScope, subject: &str) -> u32 {
        self.limiter(scope).remaining(subject)
    }

    /// When `subject`'s current window ends.
    pub fn reset_at(&self, scope: LimitScope, subject: &str) -> Option<Instant> {
        self.limiter(scope).reset_at(subject)
    }

    /// Forget `subject`'s window in `scope`.
    pub fn reset(&self, scope: LimitScope, subject: &str) {
        self.limiter(scope).reset(subject);
    }

    /// See [`CooldownTracker::check_and_stamp`].
    pub fn check_and_stamp(&self, command: &str, subject: &str, cooldown: Duration) -> Duration {
        self.cooldowns.check_and_stamp(command, subject, cooldown)
    }

    /// Shared cooldown tracker.
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Drop ended windows and cooldowns.
    #[instrument(skip(self))]
    pub fn sweep(&self) -> SweepReport {
        let report = SweepReport {
            windows: self.command.sweep() + self.global.sweep() + self.strict.sweep(),
            cooldowns: self.cooldowns.sweep(),
        };
        debug!(
            windows = report.windows,
            cooldowns = report.cooldowns,
            "Swept rate limit state"
        );
        report
    }

    /// Sweep on the configured interval until the governor is dropped.
    ///
    /// The task holds only a weak reference, so it ends on the first tick
    /// after the last strong handle goes away.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let period = self.sweep_interval;
        let governor = Arc::downgrade(self);
        info!(interval_secs = period.as_secs(), "Starting rate limit sweeper");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(governor) = governor.upgrade() else {
                    debug!("Rate governor dropped, stopping sweeper");
                    break;
                };
                governor.sweep();
            }
        })
    }
}
