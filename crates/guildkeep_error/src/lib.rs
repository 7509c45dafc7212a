//! Error types for the Guildkeep library.
//!
//! This crate provides the foundation error types used throughout the Guildkeep workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Only [`StoreError`] crosses the storage façade. [`BackendError`] is what durable
//! drivers report; the façade absorbs connectivity failures and converts conflicts.
//!
//! # Examples
//!
//! ```
//! use guildkeep_error::{GuildkeepResult, StoreError, StoreErrorKind};
//!
//! fn create_guild() -> GuildkeepResult<()> {
//!     Err(StoreError::new(StoreErrorKind::Validation("name must not be empty".into())))?
//! }
//!
//! assert!(create_guild().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod store;

pub use backend::{BackendError, BackendErrorKind};
pub use config::{ConfigError, ConfigErrorKind};
pub use error::{GuildkeepError, GuildkeepErrorKind, GuildkeepResult};
pub use store::{StoreError, StoreErrorKind, StoreResult};
