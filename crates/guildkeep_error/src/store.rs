//! Caller-visible storage errors.

use crate::{BackendError, BackendErrorKind};

/// Failures that cross the storage façade.
///
/// Missing records are not errors; they are reported as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// A uniqueness invariant was violated on create
    #[display("{} '{}' already exists", entity, key)]
    Conflict {
        /// Entity collection name
        entity: String,
        /// Key that already exists
        key: String,
    },
    /// Input was rejected before reaching any backend
    #[display("Validation failed: {}", _0)]
    Validation(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use guildkeep_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::conflict("guild", "g1");
/// assert!(err.is_conflict());
/// assert!(format!("{}", err).contains("already exists"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Uniqueness violation for `entity` keyed by `key`.
    #[track_caller]
    pub fn conflict(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Conflict {
            entity: entity.into(),
            key: key.into(),
        })
    }

    /// Malformed input.
    #[track_caller]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Validation(reason.into()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoreErrorKind {
        &self.kind
    }

    /// Whether this is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, StoreErrorKind::Conflict { .. })
    }

    /// Whether this is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind, StoreErrorKind::Validation(_))
    }
}

/// Store conflicts map onto driver conflicts; validation failures become query failures,
/// so an in-process store can stand in for a durable driver.
impl From<StoreError> for BackendError {
    #[track_caller]
    fn from(err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::Conflict { entity, key } => {
                BackendError::new(BackendErrorKind::Conflict { entity, key })
            }
            StoreErrorKind::Validation(reason) => {
                BackendError::new(BackendErrorKind::Query(reason))
            }
        }
    }
}

/// Result type for storage façade operations.
pub type StoreResult<T> = Result<T, StoreError>;
