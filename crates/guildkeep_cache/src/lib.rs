//! Short-lived key-value caching with durable/volatile failover.
//!
//! [`CacheLayer`] writes through to a durable [`CacheDriver`] while the
//! cache channel is durable and keeps an in-process map otherwise. Driver
//! failures on individual calls are served from the map for that call and
//! never change the channel's state.
//!
//! [`CacheDriver`]: guildkeep_interface::CacheDriver

#![warn(missing_docs)]

mod entry;
mod layer;

pub use entry::CacheEntry;
pub use layer::CacheLayer;
