//! Configuration and startup errors.

/// What went wrong while loading or applying configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A setting holds a value the services cannot run with
    #[display("{} {}", key, reason)]
    Invalid {
        /// Dotted path of the setting, e.g. `rate_limit.global.window_ms`
        key: String,
        /// Why the value was rejected
        reason: String,
    },
    /// Layered sources could not be read or deserialized
    #[display("Failed to load configuration: {}", _0)]
    Load(String),
    /// The effective configuration could not be rendered
    #[display("Failed to render configuration: {}", _0)]
    Render(String),
    /// The tracing subscriber could not be installed
    #[display("Failed to set up logging: {}", _0)]
    Logging(String),
}

/// Configuration error with source location.
///
/// # Examples
///
/// ```
/// use guildkeep_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::invalid("rate_limit.global.max_requests", "must be positive");
/// assert_eq!(err.key(), Some("rate_limit.global.max_requests"));
/// assert!(matches!(err.kind(), ConfigErrorKind::Invalid { .. }));
/// assert!(format!("{}", err).contains("must be positive"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The kind of error that occurred
    pub kind: ConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new configuration error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Setting `key` was rejected for `reason`.
    #[track_caller]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid {
            key: key.into(),
            reason: reason.into(),
        })
    }

    /// Sources could not be read or deserialized.
    #[track_caller]
    pub fn load(reason: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Load(reason.into()))
    }

    /// Rendering failed.
    #[track_caller]
    pub fn render(reason: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Render(reason.into()))
    }

    /// Logging setup failed.
    #[track_caller]
    pub fn logging(reason: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Logging(reason.into()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }

    /// The offending setting, when one setting is to blame.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            ConfigErrorKind::Invalid { key, .. } => Some(key),
            _ => None,
        }
    }
}
