//! Store errors

use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The write's condition did not hold over the current item state.
    ///
    /// This is the signal the auth core maps to its recoverable outcomes
    /// (rate limited, not found); it must stay distinguishable from every
    /// other failure.
    #[error("conditional check failed")]
    ConditionFailed,

    /// Any backend failure not tied to a conditional-check outcome
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is the conditional-check signal
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, Self::ConditionFailed)
    }
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;
