//! Rate governor behavior under a paused clock.

use guildkeep_rate_limit::{
    LimitScope, LimiterConfig, MAX_COOLDOWN, RateGovernor, RateLimitConfig,
};
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;

fn tight_config() -> RateLimitConfig {
    RateLimitConfig {
        command: LimiterConfig::new(3, Duration::from_secs(10)),
        global: LimiterConfig::new(5, Duration::from_secs(60)),
        strict: LimiterConfig::new(1, Duration::from_secs(900)),
        sweep_interval_secs: 30,
    }
}

#[tokio::test(start_paused = true)]
async fn test_limit_holds_until_window_passes() {
    let governor = RateGovernor::new(&tight_config());

    for _ in 0..3 {
        assert!(!governor.is_limited(LimitScope::Command, "u1"));
    }
    assert!(governor.is_limited(LimitScope::Command, "u1"));
    assert!(governor.is_limited(LimitScope::Command, "u1"));

    tokio::time::advance(Duration::from_secs(10) + Duration::from_millis(1)).await;
    assert!(!governor.is_limited(LimitScope::Command, "u1"));
    assert_eq!(governor.remaining(LimitScope::Command, "u1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_scopes_and_subjects_are_independent() {
    let governor = RateGovernor::new(&tight_config());

    assert!(!governor.is_limited(LimitScope::Strict, "u1"));
    assert!(governor.is_limited(LimitScope::Strict, "u1"));
    assert!(!governor.is_limited(LimitScope::Strict, "u2"));
    assert!(!governor.is_limited(LimitScope::Command, "u1"));
    assert!(!governor.is_limited(LimitScope::Global, "u1"));

    governor.reset(LimitScope::Strict, "u1");
    assert!(!governor.is_limited(LimitScope::Strict, "u1"));
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_reports_remaining_then_clears() {
    let governor = RateGovernor::default();
    let cooldown = Duration::from_secs(5);

    assert_eq!(governor.check_and_stamp("ping", "u1", cooldown), Duration::ZERO);

    tokio::time::advance(Duration::from_secs(1)).await;
    let wait = governor.check_and_stamp("ping", "u1", cooldown);
    assert!(wait > Duration::ZERO && wait < cooldown);
    assert_eq!(wait, Duration::from_secs(4));

    // Refused checks do not restamp.
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(governor.check_and_stamp("ping", "u1", cooldown), Duration::from_secs(2));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(governor.check_and_stamp("ping", "u1", cooldown), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_cooldown_is_clamped() {
    let governor = RateGovernor::default();
    let forever = Duration::from_secs(u64::MAX);

    assert!(governor.check_and_stamp("cmd", "u1", forever).is_zero());
    assert_eq!(governor.check_and_stamp("cmd", "u1", forever), MAX_COOLDOWN);

    tokio::time::advance(MAX_COOLDOWN).await;
    assert!(governor.check_and_stamp("cmd", "u1", forever).is_zero());
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_stamp_removed_after_expiry() {
    let governor = RateGovernor::default();
    governor.check_and_stamp("ping", "u1", Duration::from_secs(5));
    assert_eq!(governor.cooldowns().len(), 1);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(governor.cooldowns().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_reports_removed_state() {
    let governor = RateGovernor::new(&tight_config());
    for scope in LimitScope::iter() {
        governor.is_limited(scope, "u1");
    }
    governor.is_limited(LimitScope::Command, "u2");

    tokio::time::advance(Duration::from_secs(11)).await;
    let report = governor.sweep();
    assert_eq!(report.windows, 2);
    assert_eq!(governor.limiter(LimitScope::Command).tracked_subjects(), 0);
    assert_eq!(governor.limiter(LimitScope::Strict).tracked_subjects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_runs_and_stops_when_dropped() {
    let governor = Arc::new(RateGovernor::new(&tight_config()));
    governor.is_limited(LimitScope::Command, "u1");
    let sweeper = governor.spawn_sweeper();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(governor.limiter(LimitScope::Command).tracked_subjects(), 0);

    drop(governor);
    tokio::time::timeout(Duration::from_secs(60), sweeper)
        .await
        .expect("sweeper should stop once the governor is dropped")
        .unwrap();
}
