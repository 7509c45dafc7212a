//! Guildkeep: failover-aware persistence and rate governance for multi-guild bots.
//!
//! This crate wires the workspace together:
//!
//! - [`GuildkeepConfig`] loads layered configuration.
//! - [`init_observability`] installs the tracing subscriber.
//! - [`Guildkeep`] owns the failover controller, the storage façade, the
//!   cache, the rate governor and the [`CommandRegistry`], and runs their
//!   background maintenance.
//!
//! Callers that only need one piece can depend on the component crates
//! directly; everything is re-exported here for convenience.
//!
//! # Example
//!
//! ```
//! use guildkeep::{Guildkeep, GuildkeepConfig, NewGuild};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let guildkeep = Guildkeep::builder(GuildkeepConfig::default()).start().await.unwrap();
//!
//! let guild = guildkeep
//!     .store()
//!     .find_or_create_guild(NewGuild::new("g1", "Guild One", "owner-1"))
//!     .await
//!     .unwrap();
//! assert!(guild.active);
//! guildkeep.shutdown();
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod registry;
mod service;

pub use config::{CacheConfig, DatabaseConfig, GuildkeepConfig};
pub use observability::{ObservabilityConfig, init_observability};
pub use registry::{
    CommandContext, CommandContextBuilder, CommandHandler, CommandInfo, CommandRegistry, Dispatch,
};
pub use service::{Guildkeep, GuildkeepBuilder, HealthReport};

pub use guildkeep_cache::*;
pub use guildkeep_core::*;
pub use guildkeep_database::*;
pub use guildkeep_error::*;
pub use guildkeep_failover::*;
pub use guildkeep_interface::*;
pub use guildkeep_rate_limit::*;
