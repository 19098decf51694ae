//! Magic-link token records and lifecycle outcomes

use serde::{Deserialize, Serialize};

use crate::Secret;

/// Length in bytes of the salted digests used as record keys and
/// signature hashes (SHA-256).
pub const HASH_LEN: usize = 32;

/// Stored magic-link token record.
///
/// One record exists per user identity, keyed by the salted hash of the
/// normalized identifier. Consumption is recorded by setting `uat`; the
/// record is never deleted by the core (expiry is advisory and enforced
/// downstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Salted hash of the normalized user identifier (primary key)
    pub user_name_hash: [u8; HASH_LEN],
    /// Salted hash of the issued secret bound to this token
    pub signature_hash: [u8; HASH_LEN],
    /// Issued-at, epoch seconds
    pub iat: i64,
    /// Expiry, epoch seconds
    pub exp: i64,
    /// Identifier of the key material used to produce the secret (opaque)
    pub kms_key_id: String,
    /// Used-at, epoch seconds; present once the token has been consumed
    pub uat: Option<i64>,
}

impl TokenRecord {
    /// Whether the validity window has passed at `now` (epoch seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }

    /// Whether the token has been consumed
    pub fn is_consumed(&self) -> bool {
        self.uat.is_some()
    }
}

/// A freshly issued token, returned to the caller delivering the link
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The bearer secret to embed in the link
    pub secret: Secret,
    /// Expiry of the token, epoch seconds
    pub expires_at: i64,
}

/// Outcome of an issuance attempt.
///
/// `RateLimited` is a user-facing, non-fatal outcome: the caller should
/// present a generic retry-later message without timing internals.
#[derive(Debug, Clone)]
pub enum IssueOutcome {
    /// A token was written and the secret should be delivered
    Issued(IssuedToken),
    /// A prior token is still inside the re-issuance window
    RateLimited,
}

impl IssueOutcome {
    /// Whether the attempt produced a token
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued(_))
    }
}

/// Outcome of a consumption attempt.
///
/// `NotFound` covers "never issued", "wrong secret", and "already
/// consumed" indistinguishably so the caller cannot be used as an oracle.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    /// The token existed, matched, and was unconsumed; this is its
    /// pre-consumption image
    Consumed(TokenRecord),
    /// No consumable token matched
    NotFound,
}

impl ConsumeOutcome {
    /// Whether the attempt consumed a token
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed(_))
    }
}
