use std::sync::Arc;

use alloy_primitives::{address, Address};
use franchiser_chain::{MockChain, MockOp};
use franchiser_names::{NameCache, SuspectedNames};

const ALICE: Address = address!("a11ce00000000000000000000000000000000001");
const BOB: Address = address!("b0b0000000000000000000000000000000000002");

fn cache_over(chain: &Arc<MockChain>, suspected: SuspectedNames) -> Arc<NameCache> {
    Arc::new(NameCache::new(chain.clone(), suspected))
}

#[tokio::test]
async fn test_reverse_record_resolves() {
    let chain = Arc::new(MockChain::new().with_name(ALICE, "alice.eth"));
    let cache = cache_over(&chain, SuspectedNames::new());

    assert_eq!(cache.resolve_name_for_address(ALICE).await.as_deref(), Some("alice.eth"));
    assert_eq!(cache.peek_name(&ALICE).as_deref(), Some("alice.eth"));
    assert_eq!(chain.calls(MockOp::Reverse), 1);
    // No suspected candidate, so no forward verification.
    assert_eq!(chain.calls(MockOp::Forward), 0);
}

#[tokio::test]
async fn test_suspected_name_used_when_it_points_back() {
    let chain = Arc::new(MockChain::new().with_forward("bob.eth", BOB));
    let suspected: SuspectedNames = [(BOB, "bob.eth".to_string())].into_iter().collect();
    let cache = cache_over(&chain, suspected);

    assert_eq!(cache.resolve_name_for_address(BOB).await.as_deref(), Some("bob.eth"));
    // The verification filled the forward table as well.
    assert_eq!(cache.peek_address("BOB.eth"), Some(BOB));
}

#[tokio::test]
async fn test_suspected_name_used_when_reverse_lookup_fails() {
    let chain = Arc::new(MockChain::new().with_forward("bob.eth", BOB));
    chain.fail_address(MockOp::Reverse, &BOB);
    let suspected: SuspectedNames = [(BOB, "bob.eth".to_string())].into_iter().collect();
    let cache = cache_over(&chain, suspected);

    assert_eq!(cache.resolve_name_for_address(BOB).await.as_deref(), Some("bob.eth"));
    assert_eq!(chain.calls(MockOp::Reverse), 1);
    assert!(cache.is_name_settled(&BOB));
}

#[tokio::test]
async fn test_suspected_name_rejected_when_it_points_elsewhere() {
    let chain = Arc::new(MockChain::new().with_forward("bob.eth", ALICE));
    let suspected: SuspectedNames = [(BOB, "bob.eth".to_string())].into_iter().collect();
    let cache = cache_over(&chain, suspected);

    assert_eq!(cache.resolve_name_for_address(BOB).await, None);
    assert!(cache.is_name_settled(&BOB));
}

#[tokio::test]
async fn test_reverse_record_beats_suspected_name() {
    let chain = Arc::new(
        MockChain::new()
            .with_name(ALICE, "alice.eth")
            .with_forward("old-alice.eth", ALICE),
    );
    let suspected: SuspectedNames = [(ALICE, "old-alice.eth".to_string())].into_iter().collect();
    let cache = cache_over(&chain, suspected);

    assert_eq!(cache.resolve_name_for_address(ALICE).await.as_deref(), Some("alice.eth"));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_call() {
    let chain = Arc::new(MockChain::new().with_name(ALICE, "alice.eth"));
    let cache = cache_over(&chain, SuspectedNames::new());
    let release = chain.hold_address(MockOp::Reverse, &ALICE);

    let first = tokio::spawn({
        let cache = cache.clone();
        async move { cache.resolve_name_for_address(ALICE).await }
    });
    let second = tokio::spawn({
        let cache = cache.clone();
        async move { cache.resolve_name_for_address(ALICE).await }
    });
    while chain.calls(MockOp::Reverse) == 0 {
        tokio::task::yield_now().await;
    }
    tokio::task::yield_now().await;
    release.notify_one();

    assert_eq!(first.await.unwrap().as_deref(), Some("alice.eth"));
    assert_eq!(second.await.unwrap().as_deref(), Some("alice.eth"));
    assert_eq!(chain.calls(MockOp::Reverse), 1);
}

#[tokio::test]
async fn test_results_and_misses_are_cached() {
    let chain = Arc::new(MockChain::new().with_name(ALICE, "alice.eth"));
    let cache = cache_over(&chain, SuspectedNames::new());

    cache.resolve_name_for_address(ALICE).await;
    cache.resolve_name_for_address(ALICE).await;
    assert_eq!(cache.resolve_name_for_address(BOB).await, None);
    assert_eq!(cache.resolve_name_for_address(BOB).await, None);

    assert_eq!(chain.calls(MockOp::Reverse), 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let chain = Arc::new(MockChain::new().with_name(ALICE, "alice.eth"));
    let cache = cache_over(&chain, SuspectedNames::new());

    chain.fail_address(MockOp::Reverse, &ALICE);
    assert_eq!(cache.resolve_name_for_address(ALICE).await, None);
    assert!(!cache.is_name_settled(&ALICE));

    chain.clear_failures();
    assert_eq!(cache.resolve_name_for_address(ALICE).await.as_deref(), Some("alice.eth"));
    assert_eq!(chain.calls(MockOp::Reverse), 2);
}

#[tokio::test]
async fn test_invalidate_during_flight_discards_result() {
    let chain = Arc::new(MockChain::new().with_name(ALICE, "alice.eth"));
    let cache = cache_over(&chain, SuspectedNames::new());
    let release = chain.hold_address(MockOp::Reverse, &ALICE);

    let pending = tokio::spawn({
        let cache = cache.clone();
        async move { cache.resolve_name_for_address(ALICE).await }
    });
    while chain.calls(MockOp::Reverse) == 0 {
        tokio::task::yield_now().await;
    }
    cache.invalidate(&ALICE);
    release.notify_one();

    // The waiting caller still gets its answer, but the table stays empty.
    assert_eq!(pending.await.unwrap().as_deref(), Some("alice.eth"));
    assert_eq!(cache.peek_name(&ALICE), None);
    assert!(!cache.is_name_settled(&ALICE));
}

#[tokio::test]
async fn test_forward_and_avatar_lookups() {
    let chain = Arc::new(
        MockChain::new()
            .with_name(ALICE, "alice.eth")
            .with_avatar("alice.eth", "https://example.com/alice.png"),
    );
    let cache = cache_over(&chain, SuspectedNames::new());

    assert_eq!(cache.resolve_address_for_name(" Alice.ETH ").await, Some(ALICE));
    assert_eq!(cache.resolve_address_for_name("").await, None);
    assert_eq!(
        cache.resolve_avatar_for_address(ALICE).await.as_deref(),
        Some("https://example.com/alice.png")
    );
    assert_eq!(cache.peek_avatar(&ALICE).as_deref(), Some("https://example.com/alice.png"));
    assert_eq!(cache.resolve_avatar_for_address(BOB).await, None);

    cache.clear();
    assert_eq!(cache.peek_name(&ALICE), None);
    assert_eq!(cache.peek_address("alice.eth"), None);
}

#[tokio::test]
async fn test_invalidate_refetches_suspected_forward_record() {
    let chain = Arc::new(MockChain::new().with_forward("bob.eth", BOB));
    let suspected: SuspectedNames = [(BOB, "bob.eth".to_string())].into_iter().collect();
    let cache = cache_over(&chain, suspected);

    assert_eq!(cache.resolve_name_for_address(BOB).await.as_deref(), Some("bob.eth"));
    assert_eq!(chain.calls(MockOp::Forward), 1);

    cache.invalidate(&BOB);
    assert_eq!(cache.peek_address("bob.eth"), None);

    assert_eq!(cache.resolve_name_for_address(BOB).await.as_deref(), Some("bob.eth"));
    assert_eq!(chain.calls(MockOp::Reverse), 2);
    assert_eq!(chain.calls(MockOp::Forward), 2);
}
