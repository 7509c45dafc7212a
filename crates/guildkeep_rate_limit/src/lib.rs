//! Request-rate governance for bot commands.
//!
//! - [`SlidingWindowLimiter`] caps requests per subject per window.
//! - [`CooldownTracker`] enforces per-(command, subject) cooldowns.
//! - [`RateGovernor`] bundles one limiter per [`LimitScope`] with a shared
//!   cooldown tracker and a periodic sweeper that drops stale state.
//!
//! All timing uses Tokio's clock, so tests can pause and advance time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cooldown;
mod governor;
mod limiter;

pub use config::{LimiterConfig, RateLimitConfig};
pub use cooldown::{CooldownTracker, MAX_COOLDOWN};
pub use governor::{LimitScope, RateGovernor, SweepReport};
pub use limiter::SlidingWindowLimiter;
