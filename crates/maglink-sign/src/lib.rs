//! Maglink Sign - outbound request signing
//!
//! Produces SigV4-signed HTTP requests for calls to protected internal
//! endpoints. The signing context (region, service, credentials, hash) is
//! resolved per request: explicit options win, then inference from the
//! request URL's managed-endpoint hostname, then ambient defaults. A
//! request with no resolvable region fails before any I/O is attempted.

pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod signer;
pub mod sigv4;

pub use credentials::{
    CachedCredentials, Credentials, EnvCredentials, ProvideCredentials, StaticCredentials,
};
pub use endpoint::{infer, InferredEndpoint};
pub use error::SignError;
pub use signer::{HashAlgorithm, RequestSigner, SignableRequest, SigningOptions};
