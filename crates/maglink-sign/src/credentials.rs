//! Credential resolution
//!
//! The signer consumes credentials through [`ProvideCredentials`]; where
//! they come from is the environment's business. Static values and the
//! ambient environment-variable chain are provided here, plus a cached
//! wrapper that memoizes resolution with a TTL and collapses concurrent
//! resolutions into a single in-flight call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::SignError;

/// Resolved signing credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from their parts
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// The access key id
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// The session token, for temporary credentials
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// A source of signing credentials, resolved per signing operation
#[async_trait]
pub trait ProvideCredentials: Send + Sync {
    /// Resolve the current credentials
    async fn provide(&self) -> Result<Credentials, SignError>;
}

/// Fixed credentials supplied by the caller
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Wrap fixed credentials
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl ProvideCredentials for StaticCredentials {
    async fn provide(&self) -> Result<Credentials, SignError> {
        Ok(self.credentials.clone())
    }
}

/// The ambient environment-variable chain:
/// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Create the environment provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredentials for EnvCredentials {
    async fn provide(&self) -> Result<Credentials, SignError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| SignError::Credentials("AWS_ACCESS_KEY_ID is not set".to_string()))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| SignError::Credentials("AWS_SECRET_ACCESS_KEY is not set".to_string()))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();
        Ok(Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
        ))
    }
}

/// TTL-memoized credentials with single-flight resolution.
///
/// The cache state is checked and refilled under one async mutex held
/// across the inner resolution, so concurrent callers during a refresh
/// all await the same in-flight call instead of stampeding the source.
pub struct CachedCredentials<P> {
    inner: P,
    ttl: Duration,
    state: Mutex<Option<(Credentials, Instant)>>,
}

impl<P: ProvideCredentials> CachedCredentials<P> {
    /// Default cache TTL
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

    /// Wrap a provider with the default TTL
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, Self::DEFAULT_TTL)
    }

    /// Wrap a provider with an explicit TTL
    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            state: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<P: ProvideCredentials> ProvideCredentials for CachedCredentials<P> {
    async fn provide(&self) -> Result<Credentials, SignError> {
        let mut state = self.state.lock().await;
        if let Some((credentials, resolved_at)) = state.as_ref() {
            if resolved_at.elapsed() < self.ttl {
                return Ok(credentials.clone());
            }
        }

        let credentials = self.inner.provide().await?;
        *state = Some((credentials.clone(), Instant::now()));
        Ok(credentials)
    }
}

impl<P> std::fmt::Debug for CachedCredentials<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCredentials")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProvideCredentials for Arc<dyn ProvideCredentials> {
    async fn provide(&self) -> Result<Credentials, SignError> {
        self.as_ref().provide().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        resolutions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProvideCredentials for CountingProvider {
        async fn provide(&self) -> Result<Credentials, SignError> {
            self.resolutions.fetch_add(1, Ordering::SeqCst);
            Ok(Credentials::new("AKID", "secret", None))
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("AKID", "very-secret", Some("token".to_string()));
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("token"));
    }

    #[tokio::test]
    async fn test_static_provider_returns_fixed_values() {
        let provider = StaticCredentials::new(Credentials::new("AKID", "secret", None));
        let credentials = provider.provide().await.unwrap();
        assert_eq!(credentials.access_key_id(), "AKID");
        assert_eq!(credentials.secret_access_key(), "secret");
        assert!(credentials.session_token().is_none());
    }

    #[tokio::test]
    async fn test_cached_provider_resolves_once_within_ttl() {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let cached = CachedCredentials::new(CountingProvider {
            resolutions: Arc::clone(&resolutions),
        });

        for _ in 0..5 {
            cached.provide().await.unwrap();
        }
        assert_eq!(resolutions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_provider_refreshes_after_ttl() {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let cached = CachedCredentials::with_ttl(
            CountingProvider {
                resolutions: Arc::clone(&resolutions),
            },
            Duration::from_millis(0),
        );

        cached.provide().await.unwrap();
        cached.provide().await.unwrap();
        assert_eq!(resolutions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_resolution_is_single_flight() {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let cached = Arc::new(CachedCredentials::new(CountingProvider {
            resolutions: Arc::clone(&resolutions),
        }));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cached = Arc::clone(&cached);
            handles.push(tokio::spawn(async move { cached.provide().await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(resolutions.load(Ordering::SeqCst), 1);
    }
}
