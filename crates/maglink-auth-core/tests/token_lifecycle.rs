//! Integration tests for the magic-link token lifecycle
//!
//! Exercises issuance rate limiting, exactly-once consumption, oracle
//! resistance, and integrity validation against the in-memory conditional
//! store.

use std::sync::Arc;
use std::time::Duration;

use maglink_auth_core::token::{
    IssueRequest, TokenStore, ATTR_IAT, ATTR_SIGNATURE_HASH, ATTR_USER_NAME_HASH,
};
use maglink_auth_core::{crypto, AuthConfig, AuthError, MagicLinkService};
use maglink_store::{AttrValue, Item, MemoryStore};
use maglink_types::{ConsumeOutcome, IssueOutcome, Secret, UserName};

const SALT: &[u8] = b"integration-test-salt";

fn token_store() -> (TokenStore<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (TokenStore::new(Arc::clone(&store), SALT), store)
}

fn issue_request(user: &str, secret: &str, iat: i64) -> IssueRequest {
    IssueRequest {
        user_name: UserName::new(user),
        secret: Secret::new(secret),
        iat,
        exp: iat + 900,
        kms_key_id: "key-test".to_string(),
        min_reissue_interval_secs: 60,
    }
}

#[tokio::test]
async fn test_issue_then_immediate_reissue_is_rate_limited() {
    let (tokens, _) = token_store();

    let first = tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap();
    assert!(first.is_issued());

    let second = tokens
        .issue(issue_request("alice@example.com", "secret-2", 1_000))
        .await
        .unwrap();
    assert!(matches!(second, IssueOutcome::RateLimited));
}

#[tokio::test]
async fn test_reissue_succeeds_after_interval_and_overwrites() {
    let (tokens, _) = token_store();
    let alice = UserName::new("alice@example.com");

    assert!(tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap()
        .is_issued());

    // 61 seconds later the prior record predates the cutoff
    assert!(tokens
        .issue(issue_request("alice@example.com", "secret-2", 1_061))
        .await
        .unwrap()
        .is_issued());

    // The overwrite is total: the first secret no longer consumes
    let stale = tokens
        .verify_and_consume(&alice, &Secret::new("secret-1"))
        .await
        .unwrap();
    assert!(matches!(stale, ConsumeOutcome::NotFound));

    let fresh = tokens
        .verify_and_consume(&alice, &Secret::new("secret-2"))
        .await
        .unwrap();
    assert!(fresh.is_consumed());
}

#[tokio::test]
async fn test_rate_limit_is_per_identity() {
    let (tokens, _) = token_store();

    assert!(tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap()
        .is_issued());
    assert!(tokens
        .issue(issue_request("bob@example.com", "secret-2", 1_000))
        .await
        .unwrap()
        .is_issued());
}

#[tokio::test]
async fn test_consume_returns_exact_stored_fields() {
    let (tokens, _) = token_store();
    let alice = UserName::new("alice@example.com");

    tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap();

    let outcome = tokens
        .verify_and_consume(&alice, &Secret::new("secret-1"))
        .await
        .unwrap();
    let record = match outcome {
        ConsumeOutcome::Consumed(record) => record,
        ConsumeOutcome::NotFound => panic!("expected consumption to succeed"),
    };

    assert_eq!(record.iat, 1_000);
    assert_eq!(record.exp, 1_900);
    assert_eq!(record.kms_key_id, "key-test");
    // Pre-consumption image: uat not yet present
    assert_eq!(record.uat, None);
    assert_eq!(record.user_name_hash, tokens.user_key(&alice));
}

#[tokio::test]
async fn test_second_consumption_is_not_found() {
    let (tokens, _) = token_store();
    let alice = UserName::new("alice@example.com");
    let secret = Secret::new("secret-1");

    tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap();

    assert!(tokens
        .verify_and_consume(&alice, &secret)
        .await
        .unwrap()
        .is_consumed());
    assert!(matches!(
        tokens.verify_and_consume(&alice, &secret).await.unwrap(),
        ConsumeOutcome::NotFound
    ));
}

#[tokio::test]
async fn test_wrong_secret_indistinguishable_from_never_issued() {
    let (tokens, _) = token_store();

    tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap();

    let wrong_secret = tokens
        .verify_and_consume(&UserName::new("alice@example.com"), &Secret::new("wrong"))
        .await
        .unwrap();
    let never_issued = tokens
        .verify_and_consume(&UserName::new("carol@example.com"), &Secret::new("wrong"))
        .await
        .unwrap();

    assert!(matches!(wrong_secret, ConsumeOutcome::NotFound));
    assert!(matches!(never_issued, ConsumeOutcome::NotFound));

    // And the failed attempt does not burn the token
    assert!(tokens
        .verify_and_consume(&UserName::new("alice@example.com"), &Secret::new("secret-1"))
        .await
        .unwrap()
        .is_consumed());
}

#[tokio::test]
async fn test_identity_is_normalized_before_hashing() {
    let (tokens, _) = token_store();

    tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap();

    // Different spelling, same identity
    let outcome = tokens
        .verify_and_consume(&UserName::new("  Alice@Example.COM "), &Secret::new("secret-1"))
        .await
        .unwrap();
    assert!(outcome.is_consumed());
}

#[tokio::test]
async fn test_malformed_stored_record_is_integrity_error_not_not_found() {
    let (tokens, store) = token_store();
    let alice = UserName::new("alice@example.com");
    let secret = Secret::new("secret-1");

    // Seed a record whose signature hash matches (so the conditional
    // update succeeds) but whose issued-at is mistyped.
    let key = tokens.user_key(&alice);
    let signature_hash = crypto::salted_digest(SALT, secret.as_str().as_bytes());
    let mut item = Item::new();
    item.insert(ATTR_USER_NAME_HASH.to_string(), AttrValue::B(key.to_vec()));
    item.insert(
        ATTR_SIGNATURE_HASH.to_string(),
        AttrValue::B(signature_hash.to_vec()),
    );
    item.insert(ATTR_IAT.to_string(), AttrValue::S("not-a-number".into()));
    store.insert_raw(key.to_vec(), item);

    let err = tokens.verify_and_consume(&alice, &secret).await.unwrap_err();
    assert!(matches!(err, AuthError::Integrity(_)));
}

#[tokio::test]
async fn test_concurrent_consumption_single_winner() {
    let (tokens, _) = token_store();

    tokens
        .issue(issue_request("alice@example.com", "secret-1", 1_000))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let tokens = tokens.clone();
        handles.push(tokio::spawn(async move {
            tokens
                .verify_and_consume(&UserName::new("alice@example.com"), &Secret::new("secret-1"))
                .await
                .unwrap()
        }));
    }

    let mut consumed = 0;
    for handle in handles {
        if handle.await.unwrap().is_consumed() {
            consumed += 1;
        }
    }
    assert_eq!(consumed, 1);
}

#[tokio::test]
async fn test_concurrent_issuance_single_winner_per_window() {
    let (tokens, _) = token_store();

    let mut handles = Vec::new();
    for i in 0..16 {
        let tokens = tokens.clone();
        handles.push(tokio::spawn(async move {
            tokens
                .issue(issue_request(
                    "alice@example.com",
                    &format!("secret-{i}"),
                    1_000,
                ))
                .await
                .unwrap()
        }));
    }

    let mut issued = 0;
    for handle in handles {
        if handle.await.unwrap().is_issued() {
            issued += 1;
        }
    }
    assert_eq!(issued, 1);
}

#[tokio::test]
async fn test_service_issue_consume_roundtrip() {
    let config = AuthConfig::new(SALT.to_vec(), "key-test")
        .unwrap()
        .with_token_ttl(Duration::from_secs(900))
        .with_min_reissue_interval(Duration::from_secs(60));
    let service = MagicLinkService::new(config, Arc::new(MemoryStore::new()));
    let alice = UserName::new("alice@example.com");

    let issued = match service.issue(&alice).await.unwrap() {
        IssueOutcome::Issued(token) => token,
        IssueOutcome::RateLimited => panic!("first issuance must not be rate limited"),
    };

    // Immediate re-issue is inside the interval
    assert!(matches!(
        service.issue(&alice).await.unwrap(),
        IssueOutcome::RateLimited
    ));

    let record = match service.consume(&alice, &issued.secret).await.unwrap() {
        ConsumeOutcome::Consumed(record) => record,
        ConsumeOutcome::NotFound => panic!("expected consumption to succeed"),
    };
    assert_eq!(record.exp, issued.expires_at);
    assert_eq!(record.kms_key_id, "key-test");

    assert!(matches!(
        service.consume(&alice, &issued.secret).await.unwrap(),
        ConsumeOutcome::NotFound
    ));
}
