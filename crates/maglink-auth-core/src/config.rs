//! Configuration types for the token lifecycle

use std::time::Duration;

use crate::settings::{CachedSettings, SettingsSource};

/// Auth configuration, resolved once at startup.
///
/// Every binding is validated at construction; a missing or malformed
/// binding is an error here, not a trap at first use.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Hash salt, prepended to identifiers and secrets before digesting
    salt: Vec<u8>,
    /// Identifier of the key material behind issued secrets (opaque,
    /// recorded on every token for downstream verification)
    key_id: String,
    /// Token validity window
    token_ttl: Duration,
    /// Minimum interval between issuances for the same identity
    min_reissue_interval: Duration,
}

impl AuthConfig {
    /// Minimum allowed salt length in bytes
    pub const MIN_SALT_LENGTH: usize = 16;

    /// Create a validated config.
    ///
    /// # Errors
    /// Returns an error if the salt is shorter than
    /// [`MIN_SALT_LENGTH`](Self::MIN_SALT_LENGTH) bytes or the key id is
    /// empty.
    pub fn new(salt: impl Into<Vec<u8>>, key_id: impl Into<String>) -> Result<Self, ConfigError> {
        let salt = salt.into();
        if salt.len() < Self::MIN_SALT_LENGTH {
            return Err(ConfigError::SaltTooShort {
                actual: salt.len(),
                minimum: Self::MIN_SALT_LENGTH,
            });
        }
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(ConfigError::MissingBinding { name: "key_id" });
        }
        Ok(Self {
            salt,
            key_id,
            token_ttl: Duration::from_secs(15 * 60),
            min_reissue_interval: Duration::from_secs(60),
        })
    }

    /// Resolve the config from a settings source.
    ///
    /// Fetches the salt and key-id parameters through the cached settings
    /// layer, so a process restarting under load does not stampede the
    /// parameter backend.
    ///
    /// # Errors
    /// Returns an error when a parameter cannot be fetched or fails
    /// validation.
    pub async fn from_settings<S: SettingsSource>(
        settings: &CachedSettings<S>,
        salt_param: &str,
        key_id_param: &str,
    ) -> Result<Self, ConfigError> {
        let salt = settings
            .get(salt_param)
            .await
            .map_err(|e| ConfigError::Fetch(e.to_string()))?;
        let key_id = settings
            .get(key_id_param)
            .await
            .map_err(|e| ConfigError::Fetch(e.to_string()))?;
        Self::new(salt.as_bytes().to_vec(), key_id.as_ref().clone())
    }

    /// Set the token validity window
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the minimum re-issuance interval
    #[must_use]
    pub fn with_min_reissue_interval(mut self, interval: Duration) -> Self {
        self.min_reissue_interval = interval;
        self
    }

    /// The hash salt
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The key material identifier
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The token validity window
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// The minimum re-issuance interval
    pub fn min_reissue_interval(&self) -> Duration {
        self.min_reissue_interval
    }
}

/// Errors that can occur when resolving the auth config
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("salt too short: got {actual} bytes, need at least {minimum}")]
    SaltTooShort { actual: usize, minimum: usize },

    #[error("missing configuration binding: {name}")]
    MissingBinding { name: &'static str },

    #[error("failed to fetch configuration: {0}")]
    Fetch(String),
}
