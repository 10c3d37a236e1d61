use std::sync::Arc;

use alloy_primitives::{address, Address};
use franchiser_chain::{MockChain, MockOp};
use franchiser_names::{NameCache, SuspectedNames, Watch};

const ALICE: Address = address!("a11ce00000000000000000000000000000000001");
const BOB: Address = address!("b0b0000000000000000000000000000000000002");

fn setup() -> (Arc<MockChain>, Arc<NameCache>) {
    let chain = Arc::new(
        MockChain::new()
            .with_name(ALICE, "alice.eth")
            .with_name(BOB, "bob.eth")
            .with_avatar("alice.eth", "ipfs-gateway/alice"),
    );
    let cache = Arc::new(NameCache::new(chain.clone(), SuspectedNames::new()));
    (chain, cache)
}

#[tokio::test]
async fn test_name_watch_resolves_key() {
    let (_chain, cache) = setup();
    let watch = Watch::name(cache);

    watch.set(Some(ALICE)).unwrap().await.unwrap();
    assert_eq!(watch.get().as_deref(), Some("alice.eth"));
    assert_eq!(watch.key(), Some(ALICE));
}

#[tokio::test]
async fn test_same_key_is_noop() {
    let (chain, cache) = setup();
    let watch = Watch::name(cache);

    watch.set(Some(ALICE)).unwrap().await.unwrap();
    assert!(watch.set(Some(ALICE)).is_none());
    assert_eq!(watch.get().as_deref(), Some("alice.eth"));
    assert_eq!(chain.calls(MockOp::Reverse), 1);
}

#[tokio::test]
async fn test_stale_result_never_lands() {
    let (chain, cache) = setup();
    let release_alice = chain.hold_address(MockOp::Reverse, &ALICE);
    let watch = Watch::name(cache);

    let slow = watch.set(Some(ALICE)).unwrap();
    let fast = watch.set(Some(BOB)).unwrap();
    fast.await.unwrap();
    assert_eq!(watch.get().as_deref(), Some("bob.eth"));

    release_alice.notify_one();
    slow.await.unwrap();
    assert_eq!(watch.get().as_deref(), Some("bob.eth"));
    assert_eq!(watch.key(), Some(BOB));
}

#[tokio::test]
async fn test_clearing_key_clears_value() {
    let (_chain, cache) = setup();
    let watch = Watch::name(cache);

    watch.set(Some(ALICE)).unwrap().await.unwrap();
    assert!(watch.set(None).is_none());
    assert_eq!(watch.get(), None);
    assert_eq!(watch.key(), None);
}

#[tokio::test]
async fn test_subscribers_see_updates() {
    let (_chain, cache) = setup();
    let watch = Watch::name(cache);
    let mut rx = watch.subscribe();

    watch.set(Some(BOB));
    let value = rx.wait_for(|v| v.is_some()).await.unwrap().clone();
    assert_eq!(value.as_deref(), Some("bob.eth"));
}

#[tokio::test]
async fn test_address_and_avatar_watches() {
    let (_chain, cache) = setup();
    let address = Watch::address(cache.clone());
    let avatar = Watch::avatar(cache);

    address.set(Some("bob.eth".to_string())).unwrap().await.unwrap();
    avatar.set(Some("alice.eth".to_string())).unwrap().await.unwrap();
    assert_eq!(address.get(), Some(BOB));
    assert_eq!(avatar.get().as_deref(), Some("ipfs-gateway/alice"));
}

#[tokio::test]
async fn test_refresh_keeps_value_until_result() {
    let (_chain, cache) = setup();
    let watch = Watch::name(cache.clone());

    watch.set(Some(ALICE)).unwrap().await.unwrap();
    cache.invalidate(&ALICE);
    let handle = watch.refresh().unwrap();
    assert_eq!(watch.get().as_deref(), Some("alice.eth"));
    handle.await.unwrap();
    assert_eq!(watch.get().as_deref(), Some("alice.eth"));
}

#[tokio::test]
async fn test_dropped_watch_discards_pending_result() {
    let (chain, cache) = setup();
    let release = chain.hold_address(MockOp::Reverse, &ALICE);
    let watch = Watch::name(cache.clone());

    let pending = watch.set(Some(ALICE)).unwrap();
    let rx = watch.subscribe();
    drop(watch);

    release.notify_one();
    pending.await.unwrap();
    assert_eq!(*rx.borrow(), None);
    // The shared cache still keeps the answer for other views.
    assert_eq!(cache.peek_name(&ALICE).as_deref(), Some("alice.eth"));
}
