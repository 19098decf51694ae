//! Auth errors

use thiserror::Error;

use maglink_store::StoreError;

/// Authentication errors.
///
/// Recoverable outcomes (rate limited, not found) are *not* errors; they
/// are carried in [`maglink_types::IssueOutcome`] and
/// [`maglink_types::ConsumeOutcome`]. Everything here is fatal to the
/// operation that raised it.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A consumed record's stored shape failed validation.
    ///
    /// Indicates store corruption or a schema mismatch; never coerced
    /// into a not-found outcome.
    #[error("stored record failed integrity validation: {0}")]
    Integrity(String),

    /// Store failure not tied to a conditional-check outcome
    #[error("store error: {0}")]
    Store(StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}
