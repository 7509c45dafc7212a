//! Limiter settings.

use guildkeep_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one sliding-window limiter.
///
/// # Example
///
/// ```toml
/// [rate_limit.command]
/// max_requests = 5
/// window_ms = 10_000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl LimiterConfig {
    /// Limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Per-command limit: 5 requests per 10 seconds.
    pub fn command() -> Self {
        Self::new(5, Duration::from_secs(10))
    }

    /// Global per-user limit: 20 requests per minute.
    pub fn global() -> Self {
        Self::new(20, Duration::from_secs(60))
    }

    /// Sensitive operations: 5 requests per 15 minutes.
    pub fn strict() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Reject limits that would block or allow everything.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_requests` or `window_ms` is zero.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::invalid(
                format!("rate_limit.{}.max_requests", name),
                "must be positive",
            ));
        }
        if self.window_ms == 0 {
            return Err(ConfigError::invalid(
                format!("rate_limit.{}.window_ms", name),
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// The `[rate_limit]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Per-command limiter
    #[serde(default = "LimiterConfig::command")]
    pub command: LimiterConfig,
    /// Global per-user limiter
    #[serde(default = "LimiterConfig::global")]
    pub global: LimiterConfig,
    /// Limiter for sensitive operations
    #[serde(default = "LimiterConfig::strict")]
    pub strict: LimiterConfig,
    /// Seconds between sweeps of stale limiter and cooldown state
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            command: LimiterConfig::command(),
            global: LimiterConfig::global(),
            strict: LimiterConfig::strict(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Interval between sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate every limiter and the sweep interval.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.command.validate("command")?;
        self.global.validate("global")?;
        self.strict.validate("strict")?;
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.sweep_interval_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_documented_limits() {
        assert_eq!(LimiterConfig::command().window(), Duration::from_secs(10));
        assert_eq!(LimiterConfig::global().max_requests, 20);
        assert_eq!(LimiterConfig::strict().window_ms, 900_000);
        assert!(RateLimitConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut config = RateLimitConfig::default();
        config.global.window_ms = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.key(), Some("rate_limit.global.window_ms"));

        let config = RateLimitConfig {
            sweep_interval_secs: 0,
            ..RateLimitConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_tables_use_presets() {
        let config: RateLimitConfig = toml::from_str(
            r#"
            [command]
            max_requests = 3
            window_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.command.max_requests, 3);
        assert_eq!(config.strict, LimiterConfig::strict());
        assert_eq!(config.sweep_interval_secs, 60);
    }
}
