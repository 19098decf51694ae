//! Magic-link token store
//!
//! Owns the record schema and the two conditional operations of the
//! lifecycle: rate-limited issuance and one-time consumption. Each
//! operation is a single conditional write; there is no read-then-write
//! anywhere, so correctness under concurrency is exactly the store's
//! conditional-write guarantee.

use std::sync::Arc;

use chrono::Utc;

use maglink_store::{AttrValue, Condition, ConditionalStore, Item, StoreError};
use maglink_types::{
    ConsumeOutcome, IssueOutcome, IssuedToken, Secret, TokenRecord, UserName, HASH_LEN,
};

use crate::crypto::salted_digest;
use crate::AuthError;

/// Attribute names of the stored record
pub const ATTR_USER_NAME_HASH: &str = "user_name_hash";
pub const ATTR_SIGNATURE_HASH: &str = "signature_hash";
pub const ATTR_IAT: &str = "iat";
pub const ATTR_EXP: &str = "exp";
pub const ATTR_KMS_KEY_ID: &str = "kms_key_id";
pub const ATTR_UAT: &str = "uat";

/// Issuance request
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Normalized identity the token is bound to
    pub user_name: UserName,
    /// Server-issued secret to bind
    pub secret: Secret,
    /// Issued-at, epoch seconds
    pub iat: i64,
    /// Expiry, epoch seconds
    pub exp: i64,
    /// Opaque key-material identifier recorded on the token
    pub kms_key_id: String,
    /// Minimum seconds since the prior issuance for the same identity
    pub min_reissue_interval_secs: i64,
}

/// Token store over a conditional key-value store
#[derive(Clone)]
pub struct TokenStore<S> {
    store: Arc<S>,
    salt: Vec<u8>,
}

impl<S: ConditionalStore> TokenStore<S> {
    /// Create a token store hashing with the given salt
    pub fn new(store: Arc<S>, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            salt: salt.into(),
        }
    }

    /// The record key for an identity
    pub fn user_key(&self, user_name: &UserName) -> [u8; HASH_LEN] {
        salted_digest(&self.salt, user_name.as_str().as_bytes())
    }

    /// Issue a token: create the record, or overwrite a prior record old
    /// enough to re-issue.
    ///
    /// The write condition (no record exists, or the stored `iat`
    /// predates `iat - min_reissue_interval`) implements create and
    /// rate-limited overwrite in one conditional expression. Exactly one
    /// concurrent issuer can win per rate-limit window.
    ///
    /// # Errors
    /// Store failures other than the conditional check propagate as
    /// [`AuthError::Store`].
    pub async fn issue(&self, request: IssueRequest) -> Result<IssueOutcome, AuthError> {
        let user_name_hash = self.user_key(&request.user_name);
        let signature_hash = salted_digest(&self.salt, request.secret.as_str().as_bytes());

        let mut item = Item::new();
        item.insert(
            ATTR_USER_NAME_HASH.to_string(),
            AttrValue::B(user_name_hash.to_vec()),
        );
        item.insert(
            ATTR_SIGNATURE_HASH.to_string(),
            AttrValue::B(signature_hash.to_vec()),
        );
        item.insert(ATTR_IAT.to_string(), AttrValue::N(request.iat));
        item.insert(ATTR_EXP.to_string(), AttrValue::N(request.exp));
        item.insert(
            ATTR_KMS_KEY_ID.to_string(),
            AttrValue::S(request.kms_key_id),
        );

        let cutoff = request.iat - request.min_reissue_interval_secs;
        let condition = Condition::Or(vec![
            Condition::NotExists(ATTR_USER_NAME_HASH.to_string()),
            Condition::Lt(ATTR_IAT.to_string(), AttrValue::N(cutoff)),
        ]);

        match self.store.put(&user_name_hash, item, &condition).await {
            Ok(()) => Ok(IssueOutcome::Issued(IssuedToken {
                secret: request.secret,
                expires_at: request.exp,
            })),
            Err(StoreError::ConditionFailed) => {
                tracing::debug!("issuance rejected by rate-limit condition");
                Ok(IssueOutcome::RateLimited)
            }
            Err(e) => {
                tracing::error!("token issuance failed: {e}");
                Err(AuthError::Store(e))
            }
        }
    }

    /// Verify a presented secret and consume the token.
    ///
    /// Atomically sets `uat = now` under the condition *record exists,
    /// stored signature hash matches, and `uat` is not already set*,
    /// returning the pre-consumption record. Absent record, wrong secret,
    /// and already-consumed all surface as `NotFound`; the caller cannot
    /// tell them apart.
    ///
    /// # Errors
    /// A malformed stored image is [`AuthError::Integrity`]; other store
    /// failures propagate as [`AuthError::Store`].
    pub async fn verify_and_consume(
        &self,
        user_name: &UserName,
        secret: &Secret,
    ) -> Result<ConsumeOutcome, AuthError> {
        let user_name_hash = self.user_key(user_name);
        let signature_hash = salted_digest(&self.salt, secret.as_str().as_bytes());
        let now = Utc::now().timestamp();

        let mut assign = Item::new();
        assign.insert(ATTR_UAT.to_string(), AttrValue::N(now));

        let condition = Condition::And(vec![
            Condition::Exists(ATTR_SIGNATURE_HASH.to_string()),
            Condition::Eq(
                ATTR_SIGNATURE_HASH.to_string(),
                AttrValue::B(signature_hash.to_vec()),
            ),
            Condition::NotExists(ATTR_UAT.to_string()),
        ]);

        match self.store.update(&user_name_hash, assign, &condition).await {
            Ok(previous) => decode_record(&previous).map(ConsumeOutcome::Consumed),
            Err(StoreError::ConditionFailed) => {
                tracing::debug!("consumption rejected: no consumable token matched");
                Ok(ConsumeOutcome::NotFound)
            }
            Err(e) => {
                tracing::error!("token consumption failed: {e}");
                Err(AuthError::Store(e))
            }
        }
    }
}

impl<S> std::fmt::Debug for TokenStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

/// Validate a stored image into a typed record.
///
/// Shape failures mean store corruption or a schema mismatch and must not
/// be coerced into a not-found outcome.
fn decode_record(item: &Item) -> Result<TokenRecord, AuthError> {
    Ok(TokenRecord {
        user_name_hash: hash_attr(item, ATTR_USER_NAME_HASH)?,
        signature_hash: hash_attr(item, ATTR_SIGNATURE_HASH)?,
        iat: num_attr(item, ATTR_IAT)?,
        exp: num_attr(item, ATTR_EXP)?,
        kms_key_id: item
            .get(ATTR_KMS_KEY_ID)
            .and_then(AttrValue::as_s)
            .ok_or_else(|| integrity(ATTR_KMS_KEY_ID))?
            .to_string(),
        uat: match item.get(ATTR_UAT) {
            None => None,
            Some(v) => Some(v.as_n().ok_or_else(|| integrity(ATTR_UAT))?),
        },
    })
}

fn hash_attr(item: &Item, name: &str) -> Result<[u8; HASH_LEN], AuthError> {
    item.get(name)
        .and_then(AttrValue::as_b)
        .and_then(|b| <[u8; HASH_LEN]>::try_from(b).ok())
        .ok_or_else(|| integrity(name))
}

fn num_attr(item: &Item, name: &str) -> Result<i64, AuthError> {
    item.get(name)
        .and_then(AttrValue::as_n)
        .ok_or_else(|| integrity(name))
}

fn integrity(attr: &str) -> AuthError {
    AuthError::Integrity(format!("missing or mistyped attribute: {attr}"))
}
