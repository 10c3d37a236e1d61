//! Non-interactive output: an indented tree for terminals and a JSON report.

use alloy_primitives::Address;
use serde::Serialize;

use franchiser_tree::{SelectionView, ViewNode};
use franchiser_types::{explorer_url, format_votes, to_checksum_text};

use crate::explorer::{TreeSnapshot, TreeStatus};

/// Lines of the tree, one per node, with `├──`/`└──` branches.
pub fn tree_lines(root: &ViewNode) -> Vec<String> {
    let mut lines = Vec::new();
    push_node(root, "", true, true, &mut lines);
    lines
}

fn push_node(node: &ViewNode, prefix: &str, is_last: bool, is_root: bool, lines: &mut Vec<String>) {
    let branch = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}└── ")
    } else {
        format!("{prefix}├── ")
    };
    let marker = if node.is_selected { " *" } else { "" };
    lines.push(format!("{branch}{} [{}]{marker}", node.label, node.extra_text));

    let child_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    for (i, child) in node.children.iter().enumerate() {
        push_node(child, &child_prefix, i + 1 == node.children.len(), false, lines);
    }
}

/// Detail lines for the selected edge.
pub fn selection_lines(
    selection: &SelectionView,
    name_of: impl Fn(&Address) -> String,
) -> Vec<String> {
    let edge = &selection.edge;
    vec![
        format!("Franchiser:         {}", to_checksum_text(&edge.franchiser)),
        format!("Explorer:           {}", explorer_url(&edge.franchiser)),
        format!("Delegator:          {}", name_of(&edge.delegator)),
        format!("Delegatee:          {}", name_of(&edge.delegatee)),
        format!("Current Votes:      {}", format_votes(edge.votes)),
        format!("Subdelegated Votes: {}", format_votes(selection.subtree_votes)),
    ]
}

/// Full plain-text report for a settled snapshot.
pub fn plain_report(
    snapshot: &TreeSnapshot,
    view: Option<&ViewNode>,
    selection: Option<&SelectionView>,
    name_of: impl Fn(&Address) -> String,
) -> String {
    let mut out = Vec::new();
    match (snapshot.status, view) {
        (TreeStatus::Ready, Some(view)) => {
            out.extend(tree_lines(view));
            if let Some(selection) = selection {
                out.push(String::new());
                out.extend(selection_lines(selection, &name_of));
            }
            if let Some(tree) = &snapshot.tree {
                if !tree.orphans().is_empty() {
                    out.push(String::new());
                    let orphans = tree.orphans().len();
                    out.push(format!("{orphans} malformed edge(s) left out of the tree"));
                }
            }
        }
        (TreeStatus::Idle, _) => out.push("Enter an owner and a delegatee.".to_string()),
        (TreeStatus::Loading, _) => out.push("Loading...".to_string()),
        _ => out.push("No delegations found.".to_string()),
    }
    out.join("\n")
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub status: TreeStatus,
    pub owner: Option<Address>,
    pub delegatee: Option<Address>,
    pub tree: Option<&'a ViewNode>,
    pub selection: Option<JsonSelection>,
}

#[derive(Debug, Serialize)]
pub struct JsonSelection {
    pub franchiser: Address,
    pub delegator: Address,
    pub delegatee: Address,
    pub votes: String,
    pub subdelegated_votes: String,
    pub explorer_url: String,
}

impl JsonSelection {
    pub fn from_view(selection: &SelectionView) -> Self {
        let edge = &selection.edge;
        Self {
            franchiser: edge.franchiser,
            delegator: edge.delegator,
            delegatee: edge.delegatee,
            votes: format_votes(edge.votes),
            subdelegated_votes: format_votes(selection.subtree_votes),
            explorer_url: explorer_url(&edge.franchiser),
        }
    }
}

pub fn json_report(
    snapshot: &TreeSnapshot,
    view: Option<&ViewNode>,
    selection: Option<&SelectionView>,
) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        status: snapshot.status,
        owner: snapshot.owner,
        delegatee: snapshot.delegatee,
        tree: view,
        selection: selection.map(JsonSelection::from_view),
    };
    serde_json::to_string_pretty(&report)
}
