//! Call-time routing between the durable driver and the volatile store.

/// Serve one operation, preferring the durable driver.
///
/// `$durable` is awaited against the driver while the entity channel is
/// durable. Its result is returned unless failover absorbs the error, in
/// which case (or when the channel is volatile) `$volatile` is evaluated.
macro_rules! route {
    ($adapter:expr, $op:literal, |$repo:ident| $durable:expr, || $volatile:expr $(,)?) => {{
        if let Some($repo) = $adapter.durable() {
            if let Some(settled) = $adapter.settle($op, $durable.await) {
                return settled;
            }
        }
        $volatile
    }};
}

mod analytics;
mod commands;
mod guilds;
mod moderation;
mod users;

use crate::VolatileStore;
use guildkeep_error::{BackendErrorKind, StoreError, StoreResult};
use guildkeep_failover::{BackendChannel, FailoverController};
use guildkeep_interface::{BackendResult, EntityRepository};
use std::sync::Arc;
use tracing::warn;

/// Storage façade over a durable driver and the volatile store.
///
/// Routing is decided per call from the [`FailoverController`], so a single
/// process can serve some calls durably and others from memory across a
/// failover boundary. Only conflicts and validation failures reach callers:
///
/// - a connectivity failure flips the entity channel to volatile and the
///   call is replayed against the volatile store;
/// - any other driver failure is served from the volatile store for that
///   call only;
/// - a uniqueness conflict is returned as [`StoreError`].
///
/// Missing records are `Ok(None)`. Deletes are soft.
#[derive(Clone)]
pub struct StoreAdapter {
    controller: Arc<FailoverController>,
    volatile: Arc<VolatileStore>,
    durable: Option<Arc<dyn EntityRepository>>,
}

impl std::fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAdapter")
            .field("controller", &self.controller)
            .field("volatile", &self.volatile.stats())
            .field("durable", &self.durable.is_some())
            .finish()
    }
}

impl StoreAdapter {
    /// Adapter with no durable driver; every call is served from memory.
    ///
    /// Registers `volatile` to be activated whenever the entity channel
    /// enters volatile mode.
    pub fn new(controller: Arc<FailoverController>, volatile: Arc<VolatileStore>) -> Self {
        controller.add_activation(volatile.clone());
        Self {
            controller,
            volatile,
            durable: None,
        }
    }

    /// Route calls to `durable` while the entity channel is durable.
    pub fn with_durable(mut self, durable: Arc<dyn EntityRepository>) -> Self {
        self.durable = Some(durable);
        self
    }

    /// The shared failover controller.
    pub fn controller(&self) -> &Arc<FailoverController> {
        &self.controller
    }

    /// The in-process fallback store.
    pub fn volatile(&self) -> &Arc<VolatileStore> {
        &self.volatile
    }

    fn durable(&self) -> Option<&Arc<dyn EntityRepository>> {
        self.durable
            .as_ref()
            .filter(|_| self.controller.is_durable(BackendChannel::Entity))
    }

    /// Turn a driver result into the caller's result, or `None` to fall back.
    fn settle<T>(&self, operation: &'static str, result: BackendResult<T>) -> Option<StoreResult<T>> {
        let err = match result {
            Ok(value) => return Some(Ok(value)),
            Err(err) => err,
        };
        match &err.kind {
            BackendErrorKind::Conflict { entity, key } => {
                Some(Err(StoreError::conflict(entity.clone(), key.clone())))
            }
            BackendErrorKind::Connectivity(_) => {
                warn!(operation, error = %err, "Durable backend unreachable, retrying in memory");
                self.controller.report_failure(BackendChannel::Entity, &err);
                None
            }
            BackendErrorKind::Query(_) => {
                warn!(operation, error = %err, "Durable operation failed, serving this call from memory");
                None
            }
        }
    }
}

/// Reject a blank lookup key before any backend is touched.
fn require_key(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("{} is required", field)));
    }
    Ok(())
}
