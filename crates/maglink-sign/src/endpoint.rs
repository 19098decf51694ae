//! Managed-endpoint hostname inference
//!
//! Two naming conventions carry their region and service in the hostname:
//!
//! - `<id>.execute-api.<region>.amazonaws.com` -> service `execute-api`
//! - `<id>.lambda-url.<region>.on.aws` -> service `lambda`
//!
//! Anything else, including other managed endpoints under the same
//! parent domains and custom domains, is a non-match, never an error.

use url::Url;

/// A `(region, service)` pair derived from a hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredEndpoint {
    /// Region label, captured verbatim from the hostname
    pub region: String,
    /// Fixed service label for the matched convention
    pub service: String,
}

/// Infer the signing region and service from a URL string.
///
/// Only the hostname is inspected; paths and query strings are ignored.
/// Unparseable input returns `None`.
pub fn infer(url: &str) -> Option<InferredEndpoint> {
    infer_from_url(&Url::parse(url).ok()?)
}

/// Infer from an already-parsed URL
pub fn infer_from_url(url: &Url) -> Option<InferredEndpoint> {
    infer_from_host(url.host_str()?)
}

fn infer_from_host(host: &str) -> Option<InferredEndpoint> {
    let labels: Vec<&str> = host.split('.').collect();
    let (region, service) = match labels.as_slice() {
        [id, "execute-api", region, "amazonaws", "com"] if !id.is_empty() => {
            (region, "execute-api")
        }
        [id, "lambda-url", region, "on", "aws"] if !id.is_empty() => (region, "lambda"),
        _ => return None,
    };
    if region.is_empty() {
        return None;
    }
    Some(InferredEndpoint {
        region: (*region).to_string(),
        service: service.to_string(),
    })
}
