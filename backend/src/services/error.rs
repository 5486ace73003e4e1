//! Error types for report generation.

use crate::db::repository::RepositoryError;

/// Result type for report services.
pub type ReportResult<T> = Result<T, ReportError>;

/// Error type for report generation and job handling.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Store configuration could not be interpreted (e.g. unknown timezone name).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The storage collaborator failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// No pending job is registered under the given id.
    #[error("Pending report job not found: {0}")]
    JobNotFound(String),
}

impl ReportError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
