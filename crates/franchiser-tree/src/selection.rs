use alloy_primitives::{Address, U256};
use serde::Serialize;

use franchiser_types::DelegationEdge;

use crate::{DelegationTree, NodeId};

/// Currently highlighted edge, keyed by franchiser.
///
/// Only the key is stored; the edge and its subtree total are derived from
/// the tree on every [`Selection::view`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    franchiser: Option<Address>,
}

/// Derived view of the selected edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionView {
    pub node: NodeId,
    pub edge: DelegationEdge,
    pub subtree_votes: U256,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of the root edge, the default after a build.
    pub fn for_tree(tree: &DelegationTree) -> Self {
        Self { franchiser: Some(tree.root_edge().franchiser) }
    }

    /// Select the edge with this franchiser. Unknown franchisers leave the
    /// selection unchanged and return false.
    pub fn select(&mut self, tree: &DelegationTree, franchiser: Address) -> bool {
        if tree.find_node(&franchiser).is_none() {
            tracing::debug!(%franchiser, "Ignoring selection of unknown franchiser");
            return false;
        }
        self.franchiser = Some(franchiser);
        true
    }

    pub fn clear(&mut self) {
        self.franchiser = None;
    }

    pub fn selected(&self) -> Option<Address> {
        self.franchiser
    }

    pub fn view(&self, tree: &DelegationTree) -> Option<SelectionView> {
        let node = tree.find_node(&self.franchiser?)?;
        let edge = tree.edge(node)?.clone();
        Some(SelectionView { node, edge, subtree_votes: tree.subtree_aggregate_votes(node) })
    }
}
