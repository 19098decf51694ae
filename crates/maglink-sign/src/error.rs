//! Signing errors

use thiserror::Error;

/// Signing errors
#[derive(Error, Debug)]
pub enum SignError {
    /// No region from options, URL inference, or ambient defaults.
    ///
    /// Raised before credential resolution or any I/O: a signature
    /// without a region scope is invalid everywhere, so there is nothing
    /// useful to attempt.
    #[error("no signing region could be resolved")]
    MissingRegion,

    /// Credential resolution failed
    #[error("credential resolution failed: {0}")]
    Credentials(String),

    /// The request cannot be canonicalized (no host, non-ASCII header)
    #[error("request cannot be signed: {0}")]
    InvalidRequest(String),
}
