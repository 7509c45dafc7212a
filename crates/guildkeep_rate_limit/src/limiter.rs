//! Fixed-window request counting per subject.

use crate::LimiterConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Counter for one subject's current window.
#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    reset_at: Instant,
}

impl WindowState {
    fn open(now: Instant, config: &LimiterConfig) -> Self {
        Self {
            count: 1,
            reset_at: now + config.window(),
        }
    }
}

/// Caps the number of requests each subject may make per window.
///
/// The first request from a subject opens a window. Requests inside the
/// window are counted until `max_requests` is reached; further requests are
/// refused without being counted. Once the window has passed, the next
/// request opens a fresh one.
///
/// # Example
///
/// ```
/// use guildkeep_rate_limit::{LimiterConfig, SlidingWindowLimiter};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let limiter = SlidingWindowLimiter::new(LimiterConfig::new(2, Duration::from_secs(10)));
/// assert!(!limiter.is_limited("user-1"));
/// assert!(!limiter.is_limited("user-1"));
/// assert!(limiter.is_limited("user-1"));
/// assert!(!limiter.is_limited("user-2"));
/// # });
/// ```
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: LimiterConfig,
    entries: Mutex<HashMap<String, WindowState>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter with no tracked subjects.
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter settings.
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Count a request from `subject` and report whether it must be refused.
    #[instrument(skip(self), fields(max_requests = self.config.max_requests))]
    pub fn is_limited(&self, subject: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(state) = entries
            .get_mut(subject)
            .filter(|state| now <= state.reset_at)
        {
            if state.count >= self.config.max_requests {
                warn!(count = state.count, "Rate limit exceeded");
                return true;
            }
            state.count += 1;
            return false;
        }

        entries.insert(subject.to_string(), WindowState::open(now, &self.config));
        false
    }

    /// Requests `subject` may still make in its current window.
    pub fn remaining(&self, subject: &str) -> u32 {
        let now = Instant::now();
        match self.entries.lock().get(subject) {
            Some(state) if now <= state.reset_at => {
                self.config.max_requests.saturating_sub(state.count)
            }
            _ => self.config.max_requests,
        }
    }

    /// When `subject`'s current window ends, if one is open.
    pub fn reset_at(&self, subject: &str) -> Option<Instant> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(subject)
            .filter(|state| now <= state.reset_at)
            .map(|state| state.reset_at)
    }

    /// Forget `subject`'s window.
    pub fn reset(&self, subject: &str) {
        if self.entries.lock().remove(subject).is_some() {
            debug!(subject, "Rate limit window reset");
        }
    }

    /// Drop every window that has ended. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, state| now <= state.reset_at);
        before - entries.len()
    }

    /// Number of subjects with a stored window, expired or not.
    pub fn tracked_subjects(&self) -> usize {
        self.entries.lock().len()
    }
}
