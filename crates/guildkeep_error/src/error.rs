//! Top-level error wrapper types.

use crate::{BackendError, ConfigError, StoreError};

/// Every error a Guildkeep component can raise.
///
/// # Examples
///
/// ```
/// use guildkeep_error::{ConfigError, GuildkeepError};
///
/// let err: GuildkeepError = ConfigError::invalid("rate_limit.command.window_ms", "must be positive").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GuildkeepErrorKind {
    /// Storage façade error
    #[from(StoreError)]
    Store(StoreError),
    /// Durable driver error
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Guildkeep error with kind discrimination.
///
/// # Examples
///
/// ```
/// use guildkeep_error::{ConfigError, GuildkeepResult};
///
/// fn load() -> GuildkeepResult<()> {
///     Err(ConfigError::load("missing section"))?
/// }
///
/// assert!(load().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Guildkeep Error: {}", _0)]
pub struct GuildkeepError(Box<GuildkeepErrorKind>);

impl GuildkeepError {
    /// Create a new error from a kind.
    pub fn new(kind: GuildkeepErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GuildkeepErrorKind {
        &self.0
    }
}

impl<T> From<T> for GuildkeepError
where
    T: Into<GuildkeepErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Guildkeep operations.
pub type GuildkeepResult<T> = std::result::Result<T, GuildkeepError>;
