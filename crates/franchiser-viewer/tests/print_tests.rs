use std::sync::Arc;

use franchiser_chain::DelegationFetcher;
use franchiser_names::NameCache;
use franchiser_tree::SortPolicy;
use franchiser_viewer::{demo, print, Explorer};

async fn loaded_demo() -> Explorer {
    let chain = Arc::new(demo::demo_chain());
    let names = Arc::new(NameCache::new(chain.clone(), demo::demo_suspected_names()));
    let explorer = Explorer::new(DelegationFetcher::new(chain), names);
    explorer
        .set_parties(Some(demo::DEMO_OWNER), Some(demo::DEMO_DELEGATEE))
        .unwrap()
        .await
        .unwrap();
    explorer.request_names().unwrap().await.unwrap();
    explorer
}

#[tokio::test]
async fn test_plain_report_lists_tree_and_selection() {
    let explorer = loaded_demo().await;
    let view = explorer.view(SortPolicy::default());
    let selection = explorer.selection();
    let report = print::plain_report(&explorer.snapshot(), view.as_ref(), selection.as_ref(), |a| {
        explorer.display_name_for(a)
    });
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines[0], "treasury.eth [Owner]");
    assert_eq!(lines[1], "└── delegate.eth [1000.0] *");
    assert_eq!(lines[2], "    ├── alice.eth [400.0]");
    assert!(lines[3].starts_with("    │   ├── "));
    assert!(report.contains("Current Votes:      1000.0"));
    assert!(report.contains("Subdelegated Votes: 800.0"));
    assert!(report.contains("https://etherscan.io/address/"));
}

#[tokio::test]
async fn test_json_report_shape() {
    let explorer = loaded_demo().await;
    let view = explorer.view(SortPolicy::default());
    let selection = explorer.selection();
    let json = print::json_report(&explorer.snapshot(), view.as_ref(), selection.as_ref()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["status"], "ready");
    assert_eq!(value["tree"]["label"], "treasury.eth");
    assert_eq!(value["selection"]["votes"], "1000.0");
    assert_eq!(value["selection"]["subdelegated_votes"], "800.0");
}

#[test]
fn test_tree_lines_for_single_edge() {
    use alloy_primitives::{Address, U256};
    use franchiser_tree::{render_tree, DelegationTree};
    use franchiser_types::{DelegationEdge, DelegationTable};
    use std::collections::HashMap;

    let tree = DelegationTree::build(&DelegationTable::new(vec![vec![DelegationEdge::new(
        Address::repeat_byte(1),
        Address::repeat_byte(2),
        Address::repeat_byte(3),
        U256::ZERO,
    )]]))
    .unwrap();
    let names = HashMap::from([
        (Address::repeat_byte(1), "owner.eth".to_string()),
        (Address::repeat_byte(2), "delegate.eth".to_string()),
    ]);
    let view = render_tree(&tree, &names, None, SortPolicy::default());
    assert_eq!(print::tree_lines(&view), vec!["owner.eth [Owner]", "└── delegate.eth [0]"]);
}
