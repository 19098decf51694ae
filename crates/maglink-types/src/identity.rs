//! User identity and secret types

use serde::{Deserialize, Serialize};

/// Normalized user identifier.
///
/// Identifiers are email addresses. Construction normalizes the raw input
/// (trim + ASCII lowercase) so that hashing, rate limiting, and consumption
/// all operate on one canonical form regardless of how the caller spelled it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// Create a normalized user name from raw input
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    /// The normalized identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Opaque server-issued bearer secret.
///
/// Carried as the base64url string the user presents back for consumption.
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);

impl Secret {
    /// Wrap an already-encoded secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The encoded secret value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret").finish_non_exhaustive()
    }
}
