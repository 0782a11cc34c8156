//! The error type shared by every store operation.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the studio service layer.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// The caller supplied input that cannot be accepted.
    #[error("{0}")]
    Validation(String),

    /// The database or the filesystem failed underneath us.
    #[error("{0:#}")]
    Storage(anyhow::Error),
}

impl StudioError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<anyhow::Error> for StudioError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

impl From<sqlx::Error> for StudioError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.into())
    }
}

/// Result alias for service-layer operations.
pub type Result<T, E = StudioError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let id = Uuid::nil();
        let err = StudioError::not_found("supply", id);
        assert_eq!(err.to_string(), format!("supply {id} not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn storage_error_keeps_context_chain() {
        let inner = anyhow::anyhow!("disk full").context("failed to insert supply");
        let err = StudioError::from(inner);
        assert_eq!(err.to_string(), "failed to insert supply: disk full");
    }
}
