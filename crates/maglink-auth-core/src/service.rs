//! Magic-link lifecycle service
//!
//! The boundary consumed by session orchestration: issue a link for an
//! identity, consume a presented secret. Composes the token store with
//! secret generation and the configured validity window.

use std::sync::Arc;

use chrono::Utc;

use maglink_store::ConditionalStore;
use maglink_types::{ConsumeOutcome, IssueOutcome, Secret, UserName};

use crate::config::AuthConfig;
use crate::crypto::generate_secret;
use crate::token::{IssueRequest, TokenStore};
use crate::AuthError;

/// Magic-link lifecycle manager
#[derive(Clone)]
pub struct MagicLinkService<S> {
    config: AuthConfig,
    tokens: TokenStore<S>,
}

impl<S: ConditionalStore> MagicLinkService<S> {
    /// Create a service over a conditional store
    pub fn new(config: AuthConfig, store: Arc<S>) -> Self {
        let tokens = TokenStore::new(store, config.salt().to_vec());
        Self { config, tokens }
    }

    /// Issue a magic-link token for an identity.
    ///
    /// Generates a fresh secret and writes the record under the
    /// configured validity window and re-issuance interval. Returns
    /// `RateLimited` when a prior token is still inside the interval; the
    /// caller should present a generic retry-later message.
    ///
    /// # Errors
    /// Infrastructure failures propagate; no retries are performed.
    pub async fn issue(&self, identity: &UserName) -> Result<IssueOutcome, AuthError> {
        let secret = generate_secret();
        let now = Utc::now().timestamp();
        let request = IssueRequest {
            user_name: identity.clone(),
            secret,
            iat: now,
            exp: now + self.config.token_ttl().as_secs() as i64,
            kms_key_id: self.config.key_id().to_string(),
            min_reissue_interval_secs: self.config.min_reissue_interval().as_secs() as i64,
        };

        let outcome = self.tokens.issue(request).await?;
        match &outcome {
            IssueOutcome::Issued(token) => {
                tracing::debug!(expires_at = token.expires_at, "issued magic-link token");
            }
            IssueOutcome::RateLimited => {
                tracing::debug!("issuance rate limited");
            }
        }
        Ok(outcome)
    }

    /// Consume a presented secret for an identity.
    ///
    /// Exactly one consumption can succeed per issued token; every other
    /// attempt (absent, wrong secret, already used) is `NotFound`.
    ///
    /// # Errors
    /// Integrity and infrastructure failures propagate.
    pub async fn consume(
        &self,
        identity: &UserName,
        secret: &Secret,
    ) -> Result<ConsumeOutcome, AuthError> {
        let outcome = self.tokens.verify_and_consume(identity, secret).await?;
        if outcome.is_consumed() {
            tracing::debug!("consumed magic-link token");
        }
        Ok(outcome)
    }

    /// The resolved configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

impl<S> std::fmt::Debug for MagicLinkService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicLinkService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
