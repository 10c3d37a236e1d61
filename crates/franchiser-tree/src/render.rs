//! View model for front ends.
//!
//! The view wraps the delegation tree in an extra owner node, substitutes
//! resolved names for addresses and orders siblings for display. None of
//! this touches the tree itself: canonical child order stays table order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use franchiser_names::NameCache;
use franchiser_types::{format_votes, to_checksum_text};

use crate::{DelegationTree, NodeId};

/// Synchronous name source for rendering. Missing entries fall back to the address.
pub trait NameLookup {
    fn display_name(&self, address: &Address) -> Option<String>;

    fn avatar(&self, _address: &Address) -> Option<String> {
        None
    }
}

impl NameLookup for NameCache {
    fn display_name(&self, address: &Address) -> Option<String> {
        self.peek_name(address)
    }

    fn avatar(&self, address: &Address) -> Option<String> {
        self.peek_avatar(address)
    }
}

impl NameLookup for HashMap<Address, String> {
    fn display_name(&self, address: &Address) -> Option<String> {
        self.get(address).cloned()
    }
}

/// Ordering of sibling view nodes. Folders always precede leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// Full string comparison of labels.
    #[default]
    Lexicographic,
    /// Compare only the first character of each label.
    FirstChar,
}

impl SortPolicy {
    fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexicographic => a.cmp(b),
            Self::FirstChar => a.chars().next().cmp(&b.chars().next()),
        }
    }
}

impl std::fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Lexicographic => "lexicographic",
            Self::FirstChar => "first-char",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SortPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicographic" | "lex" => Ok(Self::Lexicographic),
            "first-char" | "first_char" | "firstchar" => Ok(Self::FirstChar),
            other => Err(format!(
                "unknown sort policy '{other}' (expected lexicographic or first-char)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Delegator of the root edge; not an edge itself.
    Owner,
    /// Delegatee of the root edge.
    Delegatee,
    Subdelegatee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewNode {
    /// Address shown by this node (the edge's delegatee, or the owner).
    pub address: Address,
    /// Edge key; `None` for the owner node, which cannot be selected.
    pub franchiser: Option<Address>,
    pub label: String,
    pub avatar: Option<String>,
    pub role: NodeRole,
    pub kind: NodeKind,
    pub is_selected: bool,
    pub extra_text: String,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Depth-first search by franchiser.
    pub fn find(&self, franchiser: &Address) -> Option<&ViewNode> {
        if self.franchiser.as_ref() == Some(franchiser) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(franchiser))
    }
}

fn label_for(names: &dyn NameLookup, address: &Address) -> String {
    names
        .display_name(address)
        .unwrap_or_else(|| to_checksum_text(address))
}

/// Build the view for `tree`, marking the edge keyed by `selected`.
pub fn render_tree(
    tree: &DelegationTree,
    names: &dyn NameLookup,
    selected: Option<Address>,
    policy: SortPolicy,
) -> ViewNode {
    let owner = tree.owner();
    let root = render_node(tree, tree.root(), names, selected, policy, NodeRole::Delegatee);
    ViewNode {
        address: owner,
        franchiser: None,
        label: label_for(names, &owner),
        avatar: names.avatar(&owner),
        role: NodeRole::Owner,
        kind: NodeKind::Folder,
        is_selected: false,
        extra_text: "Owner".to_string(),
        children: vec![root],
    }
}

fn render_node(
    tree: &DelegationTree,
    id: NodeId,
    names: &dyn NameLookup,
    selected: Option<Address>,
    policy: SortPolicy,
    role: NodeRole,
) -> ViewNode {
    let mut children: Vec<ViewNode> = tree
        .children(id)
        .iter()
        .map(|&child| render_node(tree, child, names, selected, policy, NodeRole::Subdelegatee))
        .collect();
    // Stable: equal keys keep table order.
    children.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| policy.compare(&a.label, &b.label))
    });

    let (address, franchiser, extra_text) = match tree.edge(id) {
        Some(edge) => (edge.delegatee, Some(edge.franchiser), format_votes(edge.votes)),
        None => (Address::ZERO, None, String::new()),
    };
    ViewNode {
        address,
        franchiser,
        label: label_for(names, &address),
        avatar: names.avatar(&address),
        role,
        kind: if tree.children(id).is_empty() { NodeKind::Leaf } else { NodeKind::Folder },
        is_selected: franchiser.is_some() && franchiser == selected,
        extra_text,
        children,
    }
}
