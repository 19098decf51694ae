//! SigV4 wire protocol
//!
//! Canonical request construction and the date-scoped HMAC chain. These
//! are bit-exact requirements: a single byte of drift in the canonical
//! form produces a signature the endpoint rejects.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

/// The fixed algorithm label of the signing scheme
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Scope terminator
pub const REQUEST_TYPE: &str = "aws4_request";

/// Timestamp format for the `x-amz-date` header (`20150830T123600Z`)
pub fn format_amz_date(date: &DateTime<Utc>) -> String {
    date.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Date stamp used in the credential scope (`20150830`)
pub fn format_date_stamp(date: &DateTime<Utc>) -> String {
    date.format("%Y%m%d").to_string()
}

/// Hex-encoded SHA-256
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// HMAC-SHA256 over one message
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// URI-encode per the signing protocol: unreserved characters pass through,
/// everything else becomes uppercase percent escapes. Slashes pass
/// through only for path encoding.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char);
            }
            b'/' if !encode_slash => out.push('/'),
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

/// Canonical URI: each segment of the (already percent-encoded) path is
/// encoded again, per the protocol's double-encoding rule. An empty path
/// canonicalizes to `/`.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    uri_encode(path, false)
}

/// Canonical query string: strictly re-encoded pairs, sorted by key then
/// value, joined with `&`. No query canonicalizes to the empty string.
pub fn canonical_query_string(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k, true), uri_encode(&v, true)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical headers block and the signed-headers list.
///
/// Input names must already be lowercase (the map's ordering is the sort
/// order); values are trimmed with internal whitespace runs collapsed.
pub fn canonical_headers(headers: &BTreeMap<String, String>) -> (String, String) {
    let mut block = String::new();
    for (name, value) in headers {
        block.push_str(name);
        block.push(':');
        block.push_str(&collapse_whitespace(value));
        block.push('\n');
    }
    let signed = headers.keys().cloned().collect::<Vec<_>>().join(";");
    (block, signed)
}

fn collapse_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.trim().chars() {
        if c.is_ascii_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Assemble the canonical request
pub fn canonical_request(
    method: &str,
    url: &Url,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> (String, String) {
    let (header_block, signed_headers) = canonical_headers(headers);
    let request = format!(
        "{method}\n{uri}\n{query}\n{header_block}\n{signed_headers}\n{payload_hash}",
        uri = canonical_uri(url.path()),
        query = canonical_query_string(url),
    );
    (request, signed_headers)
}

/// Credential scope: `<date>/<region>/<service>/aws4_request`
pub fn credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{date_stamp}/{region}/{service}/{REQUEST_TYPE}")
}

/// The string to sign over a hashed canonical request
pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request_hash: &str) -> String {
    format!("{ALGORITHM}\n{amz_date}\n{scope}\n{canonical_request_hash}")
}

/// Derive the date-scoped signing key:
/// `HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
pub fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> [u8; 32] {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, REQUEST_TYPE.as_bytes())
}

/// Final hex signature over the string to sign
pub fn sign_string(key: &[u8; 32], string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(key, string_to_sign.as_bytes()))
}
