//! Channel and mode identifiers.

use serde::{Deserialize, Serialize};

/// Independent failover channels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendChannel {
    /// Entity collections
    Entity,
    /// Key-value cache
    Cache,
}

/// Which backend serves a channel.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendMode {
    /// The durable backend is believed reachable
    #[default]
    Durable,
    /// In-process fallback
    Volatile,
}
