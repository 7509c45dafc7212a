//! Durable backend error types.

/// Failure conditions reported by a durable driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum BackendErrorKind {
    /// The backend could not be reached (connection refused, timed out, dropped)
    #[display("Backend unreachable: {}", _0)]
    Connectivity(String),
    /// A uniqueness constraint rejected the write
    #[display("Conflict on {} '{}'", entity, key)]
    Conflict {
        /// Entity collection name
        entity: String,
        /// Key that already exists
        key: String,
    },
    /// The backend was reachable but the operation failed
    #[display("Backend query failed: {}", _0)]
    Query(String),
}

/// Durable backend error with source location.
///
/// # Examples
///
/// ```
/// use guildkeep_error::{BackendError, BackendErrorKind};
///
/// let err = BackendError::new(BackendErrorKind::Connectivity("connection reset".into()));
/// assert!(err.is_connectivity());
/// assert!(format!("{}", err).contains("unreachable"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend Error: {} at line {} in {}", kind, line, file)]
pub struct BackendError {
    /// The kind of error that occurred
    pub kind: BackendErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BackendError {
    /// Create a new BackendError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: BackendErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a connectivity failure.
    #[track_caller]
    pub fn connectivity(cause: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Connectivity(cause.into()))
    }

    /// Shorthand for a failed operation on a reachable backend.
    #[track_caller]
    pub fn query(cause: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Query(cause.into()))
    }

    /// Whether the backend itself was unreachable.
    pub fn is_connectivity(&self) -> bool {
        matches!(self.kind, BackendErrorKind::Connectivity(_))
    }

    /// Whether a uniqueness constraint rejected the write.
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, BackendErrorKind::Conflict { .. })
    }
}
