//! Layered configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (`include_str!` of `guildkeep.toml`)
//! - `~/.config/guildkeep/guildkeep.toml`
//! - `./guildkeep.toml`
//! - `GUILDKEEP__<SECTION>__<KEY>` environment variables

use crate::ObservabilityConfig;
use config::{Config, Environment, File, FileFormat};
use guildkeep_error::{ConfigError, GuildkeepError, GuildkeepResult};
use guildkeep_failover::{BackendChannel, ConnectPolicy};
use guildkeep_rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../guildkeep.toml");

/// Durable backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string for the entity store
    #[serde(default)]
    pub entity_url: Option<String>,
    /// Connection string for the cache
    #[serde(default)]
    pub cache_url: Option<String>,
    /// Connection strings treated as "not configured"
    #[serde(default)]
    pub placeholder_urls: Vec<String>,
    /// Startup connection attempts per channel
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: usize,
    /// Initial backoff between connection attempts, in milliseconds
    #[serde(default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,
}

fn default_connect_attempts() -> usize {
    3
}

fn default_connect_backoff_ms() -> u64 {
    200
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            entity_url: None,
            cache_url: None,
            placeholder_urls: Vec::new(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_ms: default_connect_backoff_ms(),
        }
    }
}

impl DatabaseConfig {
    /// The connection string for `channel`, unless it is absent, blank or a
    /// placeholder.
    pub fn usable_url(&self, channel: BackendChannel) -> Option<&str> {
        let url = match channel {
            BackendChannel::Entity => self.entity_url.as_deref(),
            BackendChannel::Cache => self.cache_url.as_deref(),
        }?
        .trim();

        if url.is_empty() || self.placeholder_urls.iter().any(|p| p.trim() == url) {
            None
        } else {
            Some(url)
        }
    }

    /// Retry policy for startup connections.
    pub fn connect_policy(&self) -> ConnectPolicy {
        ConnectPolicy {
            attempts: self.connect_attempts,
            backoff: Duration::from_millis(self.connect_backoff_ms),
            ..ConnectPolicy::default()
        }
    }
}

/// In-process cache maintenance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds between maintenance runs
    #[serde(default = "default_cache_sweep_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cache_sweep_secs() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_cache_sweep_secs(),
        }
    }
}

impl CacheConfig {
    /// Interval between maintenance runs.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Complete Guildkeep configuration.
///
/// # Example
///
/// ```toml
/// [database]
/// entity_url = "mongodb://db.internal:27017/guildkeep"
///
/// [rate_limit.command]
/// max_requests = 5
/// window_ms = 10000
///
/// [observability]
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildkeepConfig {
    /// Durable backend connections
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Request limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Cache maintenance
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl GuildkeepConfig {
    /// Load configuration from every source.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged result is
    /// invalid.
    #[instrument]
    pub fn load() -> GuildkeepResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/guildkeep/guildkeep.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("guildkeep").required(false))
            .add_source(
                Environment::with_prefix("GUILDKEEP")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder)
    }

    /// Load bundled defaults overridden by a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> GuildkeepResult<Self> {
        debug!("Loading configuration from file");
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));
        Self::finish(builder)
    }

    /// Parse a TOML document on top of the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or invalid.
    pub fn from_toml(document: &str) -> GuildkeepResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(document, FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> GuildkeepResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| GuildkeepError::from(ConfigError::load(e.to_string())))?
            .try_deserialize()
            .map_err(|e| GuildkeepError::from(ConfigError::load(e.to_string())))?;

        config.validate()?;
        debug!(
            entity_configured = config.database.usable_url(BackendChannel::Entity).is_some(),
            cache_configured = config.database.usable_url(BackendChannel::Cache).is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reject settings the services cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()?;
        if self.database.connect_attempts == 0 {
            return Err(ConfigError::invalid(
                "database.connect_attempts",
                "must be positive",
            ));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "cache.sweep_interval_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_parse() {
        let config = GuildkeepConfig::from_toml("").unwrap();
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.database.connect_attempts, 3);
        assert_eq!(config.cache.sweep_interval_secs, 60);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.database.entity_url.is_none());
    }

    #[test]
    fn placeholders_and_blanks_are_unusable() {
        let database = DatabaseConfig {
            entity_url: Some("mongodb://localhost:27017/discord-bot-dashboard".into()),
            cache_url: Some("   ".into()),
            placeholder_urls: vec!["mongodb://localhost:27017/discord-bot-dashboard".into()],
            ..DatabaseConfig::default()
        };
        assert!(database.usable_url(BackendChannel::Entity).is_none());
        assert!(database.usable_url(BackendChannel::Cache).is_none());

        let database = DatabaseConfig {
            entity_url: Some(" mongodb://db:27017/prod ".into()),
            ..database
        };
        assert_eq!(
            database.usable_url(BackendChannel::Entity),
            Some("mongodb://db:27017/prod")
        );
    }

    #[test]
    fn connect_policy_follows_settings() {
        let database = DatabaseConfig {
            connect_attempts: 5,
            connect_backoff_ms: 50,
            ..DatabaseConfig::default()
        };
        let policy = database.connect_policy();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.backoff, Duration::from_millis(50));
    }

    #[test]
    fn rendered_config_reloads() {
        let config = GuildkeepConfig::from_toml("[cache]\nsweep_interval_secs = 5").unwrap();
        let rendered = config.to_toml().unwrap();
        assert_eq!(GuildkeepConfig::from_toml(&rendered).unwrap(), config);
    }
}
