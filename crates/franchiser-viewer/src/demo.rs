//! Offline sample data for `--demo`.

use alloy_primitives::{address, Address};

use franchiser_chain::MockChain;
use franchiser_names::SuspectedNames;
use franchiser_types::{votes_from_tokens, DelegationEdge, DelegationTable};

pub const DEMO_OWNER: Address = address!("0000000000000000000000000000000000d0a0e1");
pub const DEMO_DELEGATEE: Address = address!("0000000000000000000000000000000000de1e9a");

const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
const BOB: Address = address!("0000000000000000000000000000000000000b0b");
const CAROL: Address = address!("00000000000000000000000000000000000ca201");
const DAVE: Address = address!("000000000000000000000000000000000000da7e");
const ERIN: Address = address!("00000000000000000000000000000000000e7140");

fn franchiser(n: u8) -> Address {
    let mut bytes = [0xf7u8; 20];
    bytes[19] = n;
    Address::from(bytes)
}

/// Three levels with fan-out, a zero-vote leaf and a second-level subtree.
pub fn demo_table() -> DelegationTable {
    DelegationTable::new(vec![
        vec![DelegationEdge::new(
            DEMO_OWNER,
            DEMO_DELEGATEE,
            franchiser(1),
            votes_from_tokens(1_000),
        )],
        vec![
            DelegationEdge::new(DEMO_DELEGATEE, CAROL, franchiser(2), votes_from_tokens(250)),
            DelegationEdge::new(DEMO_DELEGATEE, ALICE, franchiser(3), votes_from_tokens(400)),
            DelegationEdge::new(DEMO_DELEGATEE, BOB, franchiser(4), votes_from_tokens(0)),
        ],
        vec![
            DelegationEdge::new(ALICE, DAVE, franchiser(5), votes_from_tokens(100)),
            DelegationEdge::new(ALICE, ERIN, franchiser(6), votes_from_tokens(50)),
        ],
    ])
}

/// Mock chain holding the demo table, reverse records for most parties and
/// one name that only resolves through the suspected list.
pub fn demo_chain() -> MockChain {
    MockChain::new()
        .with_delegations(DEMO_OWNER, DEMO_DELEGATEE, demo_table())
        .with_name(DEMO_OWNER, "treasury.eth")
        .with_name(DEMO_DELEGATEE, "delegate.eth")
        .with_name(ALICE, "alice.eth")
        .with_name(CAROL, "carol.eth")
        .with_forward("dave.eth", DAVE)
        .with_avatar("alice.eth", "https://example.com/alice.png")
}

pub fn demo_suspected_names() -> SuspectedNames {
    [(DAVE, "dave.eth".to_string())].into_iter().collect()
}
