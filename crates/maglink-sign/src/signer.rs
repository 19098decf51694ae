//! Request signer
//!
//! Transforms an unsigned outbound request into its signed equivalent.
//! The signer is authoritative for the final header set: the output
//! carries exactly the headers that were signed, plus the authorization
//! header computed over them.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use http::Method;
use url::Url;

use crate::credentials::{CachedCredentials, EnvCredentials, ProvideCredentials};
use crate::endpoint;
use crate::sigv4;
use crate::SignError;

/// Fallback service when neither options nor inference name one
const DEFAULT_SERVICE: &str = "execute-api";

/// An outbound request in signable form.
///
/// The body is fully materialized: the signature covers the exact bytes
/// sent, so streaming bodies must be buffered before signing.
#[derive(Debug, Clone)]
pub struct SignableRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Materialized body
    pub body: Bytes,
}

impl SignableRequest {
    /// Create a request with no headers and an empty body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Payload hash algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum HashAlgorithm {
    /// SHA-256 (the protocol default)
    #[default]
    Sha256,
}

/// Per-request signing options. Unset fields resolve per the signing
/// context rules: explicit value, then URL inference, then ambient
/// defaults.
#[derive(Clone, Default)]
pub struct SigningOptions {
    region: Option<String>,
    service: Option<String>,
    credentials: Option<Arc<dyn ProvideCredentials>>,
    hash: HashAlgorithm,
    signing_date: Option<DateTime<Utc>>,
}

impl SigningOptions {
    /// Create empty options (everything resolved from context)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit signing region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set an explicit signing service
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set an explicit credentials provider for this request
    #[must_use]
    pub fn with_credentials(mut self, provider: Arc<dyn ProvideCredentials>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Set the payload hash algorithm
    #[must_use]
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Pin the signing timestamp (otherwise the current time is used)
    #[must_use]
    pub fn with_signing_date(mut self, date: DateTime<Utc>) -> Self {
        self.signing_date = Some(date);
        self
    }
}

impl std::fmt::Debug for SigningOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningOptions")
            .field("region", &self.region)
            .field("service", &self.service)
            .field("hash", &self.hash)
            .field("signing_date", &self.signing_date)
            .finish_non_exhaustive()
    }
}

/// Outbound request signer.
///
/// Holds the ambient defaults: a region resolved once from the
/// environment at construction, and the default credential chain.
#[derive(Clone)]
pub struct RequestSigner {
    default_region: Option<String>,
    credentials: Arc<dyn ProvideCredentials>,
}

impl RequestSigner {
    /// Create a signer with ambient defaults: region from `AWS_REGION` /
    /// `AWS_DEFAULT_REGION`, credentials from the environment chain,
    /// cached with single-flight resolution.
    pub fn new() -> Self {
        Self {
            default_region: ambient_region(),
            credentials: Arc::new(CachedCredentials::new(EnvCredentials::new())),
        }
    }

    /// Replace the default credentials provider
    #[must_use]
    pub fn with_credentials(mut self, provider: Arc<dyn ProvideCredentials>) -> Self {
        self.credentials = provider;
        self
    }

    /// Replace the ambient default region
    #[must_use]
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    /// Clear the ambient default region
    #[must_use]
    pub fn without_default_region(mut self) -> Self {
        self.default_region = None;
        self
    }

    /// Sign a request.
    ///
    /// Resolution, first defined wins:
    /// - region: options, URL inference, ambient default, else
    ///   [`SignError::MissingRegion`] before any I/O;
    /// - service: options, URL inference, `"execute-api"`;
    /// - credentials: options provider, signer default;
    /// - hash and timestamp: options, protocol defaults.
    ///
    /// The returned request has the original method, URL, and body, and
    /// exactly the signer-produced header set.
    ///
    /// # Errors
    /// Credential-resolution failures propagate unchanged; requests
    /// without a host or with non-ASCII headers cannot be canonicalized.
    pub async fn sign(
        &self,
        request: SignableRequest,
        options: &SigningOptions,
    ) -> Result<SignableRequest, SignError> {
        let inferred = endpoint::infer_from_url(&request.url);

        let region = options
            .region
            .clone()
            .or_else(|| inferred.as_ref().map(|e| e.region.clone()))
            .or_else(|| self.default_region.clone())
            .ok_or(SignError::MissingRegion)?;

        let service = options
            .service
            .clone()
            .or_else(|| inferred.map(|e| e.service))
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());

        let host = host_header(&request.url)?;

        let credentials = match &options.credentials {
            Some(provider) => provider.provide().await?,
            None => self.credentials.provide().await?,
        };

        let date = options.signing_date.unwrap_or_else(Utc::now);
        let amz_date = sigv4::format_amz_date(&date);
        let date_stamp = sigv4::format_date_stamp(&date);

        // The header set to sign: every caller header (merged per name),
        // with host and the protocol headers taking precedence.
        let mut to_sign = BTreeMap::new();
        for name in request.headers.keys() {
            if *name == AUTHORIZATION {
                continue;
            }
            let mut values = Vec::new();
            for value in request.headers.get_all(name) {
                let value = value.to_str().map_err(|_| {
                    SignError::InvalidRequest(format!("header {name} is not visible ASCII"))
                })?;
                values.push(value);
            }
            to_sign.insert(name.as_str().to_string(), values.join(","));
        }
        to_sign.insert("host".to_string(), host);
        to_sign.insert("x-amz-date".to_string(), amz_date.clone());
        match credentials.session_token() {
            Some(token) => {
                to_sign.insert("x-amz-security-token".to_string(), token.to_string());
            }
            None => {
                to_sign.remove("x-amz-security-token");
            }
        }

        let payload_hash = match options.hash {
            HashAlgorithm::Sha256 => sigv4::sha256_hex(&request.body),
        };

        let (canonical, signed_headers) = sigv4::canonical_request(
            request.method.as_str(),
            &request.url,
            &to_sign,
            &payload_hash,
        );
        let scope = sigv4::credential_scope(&date_stamp, &region, &service);
        let string_to_sign =
            sigv4::string_to_sign(&amz_date, &scope, &sigv4::sha256_hex(canonical.as_bytes()));
        let key = sigv4::signing_key(
            credentials.secret_access_key(),
            &date_stamp,
            &region,
            &service,
        );
        let signature = sigv4::sign_string(&key, &string_to_sign);

        let authorization = format!(
            "{algorithm} Credential={access_key}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            algorithm = sigv4::ALGORITHM,
            access_key = credentials.access_key_id(),
        );

        let mut headers = HeaderMap::with_capacity(to_sign.len() + 1);
        for (name, value) in &to_sign {
            headers.append(parse_header_name(name)?, parse_header_value(value)?);
        }
        headers.insert(AUTHORIZATION, parse_header_value(&authorization)?);

        tracing::debug!(%region, %service, "signed outbound request");

        Ok(SignableRequest {
            method: request.method,
            url: request.url,
            headers,
            body: request.body,
        })
    }
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("default_region", &self.default_region)
            .finish_non_exhaustive()
    }
}

/// Ambient region from the environment, consulted only when neither
/// options nor inference yield one
fn ambient_region() -> Option<String> {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .ok()
        .filter(|r| !r.is_empty())
}

/// The host header value: hostname plus any non-default port
fn host_header(url: &Url) -> Result<String, SignError> {
    let host = url
        .host_str()
        .ok_or_else(|| SignError::InvalidRequest("url has no host".to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn parse_header_name(name: &str) -> Result<HeaderName, SignError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| SignError::InvalidRequest(format!("invalid header name: {name}")))
}

fn parse_header_value(value: &str) -> Result<HeaderValue, SignError> {
    HeaderValue::from_str(value)
        .map_err(|_| SignError::InvalidRequest("invalid header value for signing".to_string()))
}
