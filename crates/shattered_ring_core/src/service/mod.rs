//! Use-case services consumed by the FFI layer.
//!
//! # Responsibility
//! - Validate and normalize user input before it reaches storage.
//! - Orchestrate repository calls into screen-level operations.
//! - Classify failures into stable codes the UI can report.
//!
//! # Invariants
//! - Every successful write returns state re-read after commit, so callers
//!   refresh from committed data only.

use crate::model::{EntityId, ModelValidationError};
use crate::repo::{EntityKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod edit_session;
pub mod game_service;
pub mod npc_service;
pub mod record_service;

/// Error shared by campaign services.
#[derive(Debug)]
pub enum ServiceError {
    /// User input failed validation; nothing was written.
    InvalidInput(ModelValidationError),
    /// Target entity does not exist (never existed or deleted elsewhere).
    NotFound { kind: EntityKind, id: EntityId },
    /// Write committed but read-back disagrees with it.
    InconsistentState(&'static str),
    /// Storage failure other than not-found.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable machine-readable code for UI reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound { .. } => "not_found",
            Self::InconsistentState(_) => "inconsistent_state",
            Self::Repo(RepoError::Db(err)) if err.is_busy() => "store_busy",
            Self::Repo(RepoError::InvalidData(_)) => "invalid_data",
            Self::Repo(_) => "store_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl From<ModelValidationError> for ServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::db::DbError;
    use crate::model::ModelValidationError;
    use crate::repo::{EntityKind, RepoError};

    #[test]
    fn repo_not_found_maps_to_not_found_code() {
        let err = ServiceError::from(RepoError::NotFound {
            kind: EntityKind::Quest,
            id: 7,
        });
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "quest not found: 7");
    }

    #[test]
    fn busy_database_is_classified_separately() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = ServiceError::from(RepoError::Db(DbError::Sqlite(busy)));
        assert_eq!(err.code(), "store_busy");
    }

    #[test]
    fn validation_errors_are_invalid_input() {
        let err = ServiceError::from(ModelValidationError::BlankName);
        assert_eq!(err.code(), "invalid_input");
    }
}
