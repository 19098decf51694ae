//! Cryptographic utilities for the token lifecycle
//!
//! The salted digest here is wire-exact: any co-located verifier computes
//! the same bytes or nothing interoperates.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use maglink_types::{Secret, HASH_LEN};

/// Number of random bytes behind a generated secret
pub const SECRET_LEN: usize = 32;

/// Salted one-way digest: `SHA-256(salt || value)`.
///
/// Salt is prepended, then the value, in a single pass with no separator.
pub fn salted_digest(salt: &[u8], value: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(value);
    hasher.finalize().into()
}

/// Generate a fresh bearer secret from the OS RNG.
///
/// Encoded as unpadded base64url; the signature hash is computed over the
/// encoded form, i.e. the exact bytes the user presents back.
pub fn generate_secret() -> Secret {
    let mut bytes = [0u8; SECRET_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Secret::new(URL_SAFE_NO_PAD.encode(bytes))
}

/// Constant-time byte slice comparison.
///
/// Comparison time depends only on the lengths, not the contents.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
