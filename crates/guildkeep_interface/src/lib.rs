//! Durable driver contracts for the Guildkeep persistence library.
//!
//! A durable backend plugs in by implementing the per-entity repository
//! traits (or [`EntityRepository`] as a whole), a [`DurableConnection`] that
//! reports connectivity, and optionally a [`CacheDriver`] for the cache
//! channel. Drivers report failures as [`guildkeep_error::BackendError`];
//! the storage façade decides whether a failure is absorbed by failover.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod connection;
mod repository;

pub use cache::CacheDriver;
pub use connection::{ConnectivityEvent, DurableConnection};
pub use repository::{
    AnalyticsRepository, BackendResult, CustomCommandRepository, EntityRepository,
    GuildRepository, ModerationRepository, UserRepository,
};
