//! Failover-aware entity storage for Guildkeep.
//!
//! [`StoreAdapter`] is the storage façade used by the rest of the bot. Every
//! call is routed at call time: to the durable driver while the entity
//! channel is durable, otherwise to the in-process [`VolatileStore`]. A
//! durable call that fails for connectivity reasons flips the channel and is
//! replayed against the volatile store inside the same call, so callers only
//! ever see conflicts and validation failures.
//!
//! Records written during an outage stay in memory; nothing is migrated when
//! the durable backend returns.
//!
//! # Example
//!
//! ```
//! use guildkeep_core::NewGuild;
//! use guildkeep_database::{StoreAdapter, VolatileStore};
//! use guildkeep_failover::FailoverController;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = StoreAdapter::new(
//!     Arc::new(FailoverController::new()),
//!     Arc::new(VolatileStore::new()),
//! );
//!
//! let guild = store
//!     .find_or_create_guild(NewGuild::new("g1", "Guild", "owner"))
//!     .await
//!     .unwrap();
//! assert_eq!(guild.guild_id, "g1");
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod volatile;

pub use adapter::StoreAdapter;
pub use volatile::{VolatileSnapshot, VolatileStats, VolatileStore};
