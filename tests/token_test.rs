use std::sync::Arc;

use chrono::Utc;

use runledger::error::Error;
use runledger::model::{ApiToken, TokenId};
use runledger::store::Store;
use runledger::store::memory::MemoryStore;
use runledger::token::{SNIPPET_LEN, TokenVerifier, hash_api_key};

const KEY_A: &str = "4A7F9C2E1B8D6F3A5C0E7B9D2F4A6C8E";
const KEY_B: &str = "4A7F9C2EFFFFFFFFFFFFFFFFFFFFFFFF"; // same snippet as KEY_A

fn token_for(sub: &str, api_key: &str) -> ApiToken {
    let now = Utc::now();
    ApiToken {
        id: TokenId::new(),
        active: true,
        sub: sub.to_string(),
        snippet: api_key[..SNIPPET_LEN].to_string(),
        hash: hash_api_key(api_key).unwrap(),
        created_at: now,
        updated_at: now,
    }
}

fn setup() -> (Arc<MemoryStore>, TokenVerifier) {
    let store = Arc::new(MemoryStore::new());
    let verifier = TokenVerifier::new(store.clone());
    (store, verifier)
}

#[tokio::test]
async fn valid_key_resolves_the_tenant() {
    let (store, verifier) = setup();
    store.insert_token(&token_for("tenant-a", KEY_A)).await.unwrap();

    let sub = verifier.verify(KEY_A).await.unwrap();
    assert_eq!(sub, "tenant-a");
}

#[tokio::test]
async fn malformed_keys_never_reach_the_store() {
    let (store, verifier) = setup();
    store.insert_token(&token_for("tenant-a", KEY_A)).await.unwrap();

    let lowercase = KEY_A.to_lowercase();
    for bad in [
        "",
        "short",
        lowercase.as_str(),
        "4A7F9C2E1B8D6F3A5C0E7B9D2F4A6C8", // 31 chars
        "ZZ7F9C2E1B8D6F3A5C0E7B9D2F4A6C8E", // non-hex
    ] {
        let err = verifier.verify(bad).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
    }
    assert_eq!(store.token_lookups(), 0);
}

#[tokio::test]
async fn failure_causes_are_indistinguishable_at_the_boundary() {
    let (store, verifier) = setup();
    store.insert_token(&token_for("tenant-a", KEY_A)).await.unwrap();

    // well-formed key with no matching snippet
    let no_match = verifier
        .verify("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF")
        .await
        .unwrap_err();
    // well-formed key whose snippet matches but whose hash does not
    let near_miss = verifier.verify(KEY_B).await.unwrap_err();

    assert!(matches!(no_match, Error::Unauthorized));
    assert!(matches!(near_miss, Error::Unauthorized));
    assert_eq!(no_match.to_string(), near_miss.to_string());
    // the near miss did hit the store
    assert_eq!(store.token_lookups(), 2);
}

#[tokio::test]
async fn inactive_tokens_are_rejected() {
    let (store, verifier) = setup();
    let mut token = token_for("tenant-a", KEY_A);
    token.active = false;
    store.insert_token(&token).await.unwrap();

    let err = verifier.verify(KEY_A).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
}

#[tokio::test]
async fn token_with_empty_hash_is_rejected() {
    let (store, verifier) = setup();
    let mut token = token_for("tenant-a", KEY_A);
    token.hash = String::new();
    store.insert_token(&token).await.unwrap();

    let err = verifier.verify(KEY_A).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
}

#[test]
fn hashes_are_salted() {
    let first = hash_api_key(KEY_A).unwrap();
    let second = hash_api_key(KEY_A).unwrap();
    assert_ne!(first, second);
    assert!(first.starts_with("$argon2"));
}
