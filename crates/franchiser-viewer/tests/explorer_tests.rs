use std::sync::Arc;

use alloy_primitives::{Address, U256};
use franchiser_chain::{DelegationFetcher, MockChain, MockOp};
use franchiser_names::{NameCache, SuspectedNames};
use franchiser_tree::SortPolicy;
use franchiser_types::{to_checksum_text, DelegationEdge, DelegationTable};
use franchiser_viewer::{demo, Explorer, TreeStatus};

fn addr(n: u8) -> Address {
    Address::repeat_byte(n)
}

fn chain_table() -> DelegationTable {
    DelegationTable::new(vec![
        vec![DelegationEdge::new(addr(0xaa), addr(0xbb), addr(0xf1), U256::from(100u64))],
        vec![DelegationEdge::new(addr(0xbb), addr(0xcc), addr(0xf2), U256::from(40u64))],
    ])
}

fn explorer_over(chain: &Arc<MockChain>) -> Explorer {
    let names = Arc::new(NameCache::new(chain.clone(), SuspectedNames::new()));
    Explorer::new(DelegationFetcher::new(chain.clone()), names)
}

#[tokio::test]
async fn test_idle_until_both_parties_set() {
    let chain = Arc::new(MockChain::new());
    let explorer = explorer_over(&chain);

    assert_eq!(explorer.snapshot().status, TreeStatus::Idle);
    assert!(explorer.set_parties(Some(addr(0xaa)), None).is_none());
    assert_eq!(explorer.snapshot().status, TreeStatus::Idle);
    assert!(explorer.view(SortPolicy::default()).is_none());
    assert_eq!(chain.calls(MockOp::Delegations), 0);
}

#[tokio::test]
async fn test_loading_then_ready_with_root_selected() {
    let chain = Arc::new(MockChain::new().with_delegations(addr(0xaa), addr(0xbb), chain_table()));
    let explorer = explorer_over(&chain);

    let fetch = explorer.set_parties(Some(addr(0xaa)), Some(addr(0xbb))).unwrap();
    assert_eq!(explorer.snapshot().status, TreeStatus::Loading);
    fetch.await.unwrap();

    let snapshot = explorer.snapshot();
    assert_eq!(snapshot.status, TreeStatus::Ready);
    assert_eq!(snapshot.tree.unwrap().len(), 2);

    let selection = explorer.selection().unwrap();
    assert_eq!(selection.edge.franchiser, addr(0xf1));
    assert_eq!(selection.edge.votes, U256::from(100u64));
    assert_eq!(selection.subtree_votes, U256::from(40u64));

    assert!(explorer.select(addr(0xf2)));
    let selection = explorer.selection().unwrap();
    assert_eq!(selection.edge.votes, U256::from(40u64));
    assert_eq!(selection.subtree_votes, U256::ZERO);
    assert!(!explorer.select(addr(0x99)));
}

#[tokio::test]
async fn test_failed_query_reads_as_no_data() {
    let chain = Arc::new(MockChain::new());
    let explorer = explorer_over(&chain);

    explorer
        .set_parties(Some(addr(0xaa)), Some(addr(0xbb)))
        .unwrap()
        .await
        .unwrap();
    let snapshot = explorer.snapshot();
    assert_eq!(snapshot.status, TreeStatus::NoData);
    assert!(snapshot.tree.is_none());
    assert!(explorer.selection().is_none());
    assert!(!explorer.select(addr(0xf1)));
}

#[tokio::test]
async fn test_unchanged_pair_does_not_refetch() {
    let chain = Arc::new(MockChain::new().with_delegations(addr(0xaa), addr(0xbb), chain_table()));
    let explorer = explorer_over(&chain);

    explorer
        .set_parties(Some(addr(0xaa)), Some(addr(0xbb)))
        .unwrap()
        .await
        .unwrap();
    assert!(explorer.set_parties(Some(addr(0xaa)), Some(addr(0xbb))).is_none());
    assert_eq!(chain.calls(MockOp::Delegations), 1);

    explorer.refresh().unwrap().await.unwrap();
    assert_eq!(chain.calls(MockOp::Delegations), 2);
    assert_eq!(explorer.snapshot().status, TreeStatus::Ready);
}

#[tokio::test]
async fn test_superseded_fetch_is_dropped() {
    let other = DelegationTable::new(vec![vec![DelegationEdge::new(
        addr(0xaa),
        addr(0xdd),
        addr(0xf9),
        U256::from(5u64),
    )]]);
    let chain = Arc::new(
        MockChain::new()
            .with_delegations(addr(0xaa), addr(0xbb), chain_table())
            .with_delegations(addr(0xaa), addr(0xdd), other),
    );
    let release = chain.hold_delegations(&addr(0xaa), &addr(0xbb));
    let explorer = explorer_over(&chain);

    let slow = explorer.set_parties(Some(addr(0xaa)), Some(addr(0xbb))).unwrap();
    let fast = explorer.set_parties(Some(addr(0xaa)), Some(addr(0xdd))).unwrap();
    fast.await.unwrap();
    release.notify_one();
    slow.await.unwrap();

    let snapshot = explorer.snapshot();
    assert_eq!(snapshot.delegatee, Some(addr(0xdd)));
    assert_eq!(snapshot.tree.unwrap().root_edge().franchiser, addr(0xf9));
    assert_eq!(explorer.selection().unwrap().edge.franchiser, addr(0xf9));
}

#[tokio::test]
async fn test_clearing_a_party_cancels_fetch() {
    let chain = Arc::new(MockChain::new().with_delegations(addr(0xaa), addr(0xbb), chain_table()));
    let release = chain.hold_delegations(&addr(0xaa), &addr(0xbb));
    let explorer = explorer_over(&chain);

    let pending = explorer.set_parties(Some(addr(0xaa)), Some(addr(0xbb))).unwrap();
    assert!(explorer.set_parties(Some(addr(0xaa)), None).is_none());
    release.notify_one();
    pending.await.unwrap();

    let snapshot = explorer.snapshot();
    assert_eq!(snapshot.status, TreeStatus::Idle);
    assert!(snapshot.tree.is_none());
}

#[tokio::test]
async fn test_names_fill_in_after_request() {
    let chain = Arc::new(demo::demo_chain());
    let names = Arc::new(NameCache::new(chain.clone(), demo::demo_suspected_names()));
    let explorer = Explorer::new(DelegationFetcher::new(chain.clone()), names);

    explorer
        .set_parties(Some(demo::DEMO_OWNER), Some(demo::DEMO_DELEGATEE))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(
        explorer.display_name_for(&demo::DEMO_OWNER),
        to_checksum_text(&demo::DEMO_OWNER)
    );

    explorer.request_names().unwrap().await.unwrap();
    assert_eq!(explorer.display_name_for(&demo::DEMO_OWNER), "treasury.eth");

    let view = explorer.view(SortPolicy::Lexicographic).unwrap();
    assert_eq!(view.label, "treasury.eth");
    let root = &view.children[0];
    assert_eq!(root.label, "delegate.eth");
    let labels: Vec<&str> = root.children.iter().map(|c| c.label.as_str()).collect();
    // alice.eth has children so it leads; the rest follow by label, and the
    // unnamed party sorts by its address text.
    assert_eq!(labels[0], "alice.eth");
    assert!(labels[1].starts_with("0x"));
    assert_eq!(labels[2], "carol.eth");

    // dave.eth has no reverse record but is a verified suspected name.
    let alice = &root.children[0];
    let sub: Vec<&str> = alice.children.iter().map(|c| c.label.as_str()).collect();
    assert!(sub.contains(&"dave.eth"));
}

#[tokio::test]
async fn test_resolve_party_accepts_addresses_and_names() {
    let chain = Arc::new(MockChain::new().with_name(addr(0xaa), "alice.eth"));
    let explorer = explorer_over(&chain);

    assert_eq!(explorer.resolve_party("alice.eth").await, Some(addr(0xaa)));
    assert_eq!(explorer.resolve_party("nobody.eth").await, None);
    assert_eq!(
        explorer.resolve_party(&format!(" {} ", to_checksum_text(&addr(0xbb)))).await,
        Some(addr(0xbb))
    );
    assert_eq!(explorer.resolve_party("0x1234").await, None);
}
