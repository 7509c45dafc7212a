//! Failover state for the Guildkeep persistence library.
//!
//! [`FailoverController`] is the single source of truth for whether a
//! durable backend is usable. It tracks two independent channels (entity
//! storage and cache), each either [`BackendMode::Durable`] or
//! [`BackendMode::Volatile`], and changes state only in response to
//! connection-level events from the driver.
//!
//! # Example
//!
//! ```
//! use guildkeep_failover::{BackendChannel, BackendMode, FailoverController};
//! use guildkeep_interface::ConnectivityEvent;
//!
//! let controller = FailoverController::new();
//! assert_eq!(controller.mode(BackendChannel::Entity), BackendMode::Durable);
//!
//! controller.handle_event(BackendChannel::Entity, &ConnectivityEvent::Disconnected);
//! assert_eq!(controller.mode(BackendChannel::Entity), BackendMode::Volatile);
//! assert_eq!(controller.mode(BackendChannel::Cache), BackendMode::Durable);
//!
//! controller.handle_event(BackendChannel::Entity, &ConnectivityEvent::Reconnected);
//! assert_eq!(controller.mode(BackendChannel::Entity), BackendMode::Durable);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attach;
mod controller;
mod mode;
mod observer;

pub use attach::ConnectPolicy;
pub use controller::{ChannelSnapshot, FailoverController, FailoverSnapshot};
pub use mode::{BackendChannel, BackendMode};
pub use observer::{FailoverObserver, ModeTransition, TracingObserver, VolatileActivation};
