//! Session registry: caching, aliasing, and mismatch validation.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use stratus::SessionRegistry;
use stratus::domain::error::SessionError;

use crate::helpers::{
    FailingIdentitySource, FixedIdentitySource, FixedSessionLoader, TEST_ACCOUNT, TEST_REGION,
};

fn registry(
    loader: &Arc<FixedSessionLoader>,
    identity: &Arc<FixedIdentitySource>,
) -> SessionRegistry {
    let loader: Arc<dyn stratus::ports::SessionLoader> = loader.clone();
    let identity: Arc<dyn stratus::ports::IdentitySource> = identity.clone();
    SessionRegistry::new(loader, identity)
}

#[tokio::test]
async fn test_second_lookup_returns_identical_session_without_loading() {
    let loader = FixedSessionLoader::new(TEST_REGION);
    let identity = FixedIdentitySource::new(TEST_ACCOUNT);
    let registry = registry(&loader, &identity);

    let first = registry
        .session(None, Some(TEST_REGION))
        .await
        .expect("first lookup");
    let second = registry
        .session(None, Some(TEST_REGION))
        .await
        .expect("second lookup");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.call_count(), 1);
}

#[tokio::test]
async fn test_lookup_by_actual_identity_hits_the_aliased_entry() {
    let loader = FixedSessionLoader::new(TEST_REGION);
    let identity = FixedIdentitySource::new(TEST_ACCOUNT);
    let registry = registry(&loader, &identity);

    let first = registry.session(None, None).await.expect("underspecified");
    // Fully-specified lookup by the session's actual identity: single hit,
    // no second load.
    let second = registry
        .session(Some(TEST_ACCOUNT), Some(TEST_REGION))
        .await
        .expect("by actual identity");
    let third = registry
        .session(Some(TEST_ACCOUNT), None)
        .await
        .expect("by actual account");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(loader.call_count(), 1);
    // (None,None), (None,region), (account,None), (account,region)
    assert_eq!(registry.cached_keys(), 4);
}

#[tokio::test]
async fn test_no_duplicate_session_for_one_resolved_pair() {
    let loader = FixedSessionLoader::new(TEST_REGION);
    let identity = FixedIdentitySource::new(TEST_ACCOUNT);
    let registry = registry(&loader, &identity);

    // Two requests under different keys that resolve to the same concrete
    // (account, region): the second load is discarded in favor of the
    // already-cached session.
    let by_region = registry
        .session(None, Some(TEST_REGION))
        .await
        .expect("by region");
    let underspecified = registry.session(None, None).await.expect("underspecified");

    assert_eq!(loader.call_count(), 2);
    assert!(Arc::ptr_eq(&by_region, &underspecified));
}

#[tokio::test]
async fn test_region_mismatch_fails_and_caches_nothing() {
    let loader = FixedSessionLoader::new("eu-central-1");
    let identity = FixedIdentitySource::new(TEST_ACCOUNT);
    let registry = registry(&loader, &identity);

    let err = registry
        .session(None, Some(TEST_REGION))
        .await
        .expect_err("region mismatch");
    let domain = err.downcast_ref::<SessionError>().expect("domain error");
    assert!(
        matches!(domain, SessionError::RegionMismatch { requested, actual }
            if requested == TEST_REGION && actual == "eu-central-1")
    );
    assert_eq!(registry.cached_keys(), 0);

    // The failed attempt left no partial state; the next call loads afresh.
    registry
        .session(None, Some(TEST_REGION))
        .await
        .expect_err("still mismatched");
    assert_eq!(loader.call_count(), 2);
}

#[tokio::test]
async fn test_account_mismatch_fails_and_caches_nothing() {
    let loader = FixedSessionLoader::new(TEST_REGION);
    let identity = FixedIdentitySource::new("999999999999");
    let registry = registry(&loader, &identity);

    let err = registry
        .session(Some(TEST_ACCOUNT), None)
        .await
        .expect_err("account mismatch");
    let domain = err.downcast_ref::<SessionError>().expect("domain error");
    assert!(
        matches!(domain, SessionError::AccountMismatch { requested, actual }
            if requested == TEST_ACCOUNT && actual == "999999999999")
    );
    assert_eq!(registry.cached_keys(), 0);
}

#[tokio::test]
async fn test_identity_fetched_once_per_session() {
    let loader = FixedSessionLoader::new(TEST_REGION);
    let identity = FixedIdentitySource::new(TEST_ACCOUNT);
    let registry = registry(&loader, &identity);

    let session = registry.session(None, None).await.expect("session");
    // Validation already fetched the identity once; these are memo hits.
    let id1 = registry.identity(&session).await.expect("identity");
    let id2 = registry.identity(&session).await.expect("identity again");
    let account = registry.account_id(&session).await.expect("account");

    assert_eq!(id1, id2);
    assert_eq!(account, TEST_ACCOUNT);
    assert_eq!(identity.call_count(), 1);
}

#[tokio::test]
async fn test_identity_failure_leaves_cache_untouched() {
    let loader = FixedSessionLoader::new(TEST_REGION);
    let session_loader: Arc<dyn stratus::ports::SessionLoader> = loader.clone();
    let registry = SessionRegistry::new(session_loader, Arc::new(FailingIdentitySource));

    registry
        .session(None, None)
        .await
        .expect_err("identity lookup fails");
    assert_eq!(registry.cached_keys(), 0);

    registry
        .session(None, None)
        .await
        .expect_err("fails again, retried from scratch");
    assert_eq!(loader.call_count(), 2);
}
