//! Tree reconstruction.
//!
//! Row `i + 1` of a delegation table holds every edge whose delegator is a
//! delegatee of row `i`, but the rows carry no parent links. The builder
//! restores them level by level:
//! 1. Row 0's first edge becomes the root
//! 2. For each later row, index the previous level by delegatee
//! 3. Attach each edge under the first previous-level node whose delegatee
//!    is the edge's delegator
//!
//! Attachment only ever looks one row back, so malformed input (cycles,
//! self-delegation) cannot make the build loop.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::Serialize;

use franchiser_types::{DelegationEdge, DelegationTable};

/// Index of a node in its tree's arena. Only meaningful for the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationNode {
    pub edge: DelegationEdge,
    pub parent: Option<NodeId>,
    /// Table order.
    pub children: Vec<NodeId>,
    pub depth: usize,
}

impl DelegationNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Why an edge was left out of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    /// Row 0 had more than one edge.
    ExtraRootEdge,
    /// Another edge already used this franchiser.
    DuplicateFranchiser,
    /// No node of the previous level delegates to this edge's delegator.
    NoParent,
}

impl std::fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ExtraRootEdge => "extra root edge",
            Self::DuplicateFranchiser => "duplicate franchiser",
            Self::NoParent => "no parent",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanEdge {
    pub row: usize,
    pub edge: DelegationEdge,
    pub reason: OrphanReason,
}

/// Rooted, ordered delegation tree. Nodes are stored in level order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationTree {
    nodes: Vec<DelegationNode>,
    #[serde(skip)]
    index: HashMap<Address, NodeId>,
    orphans: Vec<OrphanEdge>,
}

impl DelegationTree {
    /// Build the tree, or `None` when the table has no root edge.
    pub fn build(table: &DelegationTable) -> Option<Self> {
        let rows = table.rows();
        let (root_edge, extra_root_edges) = rows.first()?.split_first()?;

        let mut tree = Self {
            nodes: Vec::with_capacity(table.edge_count()),
            index: HashMap::new(),
            orphans: Vec::new(),
        };
        let root = tree.push(root_edge.clone(), None, 0);
        for edge in extra_root_edges {
            tree.exclude(0, edge, OrphanReason::ExtraRootEdge);
        }

        let mut previous_level = vec![root];
        for (row_index, row) in rows.iter().enumerate().skip(1) {
            let mut parents: HashMap<Address, NodeId> = HashMap::new();
            for &id in &previous_level {
                parents.entry(tree.nodes[id.0].edge.delegatee).or_insert(id);
            }

            let mut level = Vec::with_capacity(row.len());
            for edge in row {
                if tree.index.contains_key(&edge.franchiser) {
                    tree.exclude(row_index, edge, OrphanReason::DuplicateFranchiser);
                    continue;
                }
                let Some(&parent) = parents.get(&edge.delegator) else {
                    tree.exclude(row_index, edge, OrphanReason::NoParent);
                    continue;
                };
                let id = tree.push(edge.clone(), Some(parent), row_index);
                tree.nodes[parent.0].children.push(id);
                level.push(id);
            }
            previous_level = level;
        }

        tracing::debug!(
            nodes = tree.nodes.len(),
            orphans = tree.orphans.len(),
            depth = rows.len(),
            "Built delegation tree"
        );
        Some(tree)
    }

    fn push(&mut self, edge: DelegationEdge, parent: Option<NodeId>, depth: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(edge.franchiser, id);
        self.nodes.push(DelegationNode { edge, parent, children: Vec::new(), depth });
        id
    }

    fn exclude(&mut self, row: usize, edge: &DelegationEdge, reason: OrphanReason) {
        tracing::warn!(
            row,
            franchiser = %edge.franchiser,
            delegator = %edge.delegator,
            delegatee = %edge.delegatee,
            %reason,
            "Excluding delegation edge from tree"
        );
        self.orphans.push(OrphanEdge { row, edge: edge.clone(), reason });
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_edge(&self) -> &DelegationEdge {
        &self.nodes[0].edge
    }

    /// The root edge's delegator.
    pub fn owner(&self) -> Address {
        self.root_edge().delegator
    }

    pub fn node(&self, id: NodeId) -> Option<&DelegationNode> {
        self.nodes.get(id.0)
    }

    pub fn edge(&self, id: NodeId) -> Option<&DelegationEdge> {
        self.node(id).map(|n| &n.edge)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Row the node came from; the root is at depth 0.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(|n| n.depth)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true for a built tree; present for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_node(&self, franchiser: &Address) -> Option<NodeId> {
        self.index.get(franchiser).copied()
    }

    /// Sum of `votes` over every descendant of `id`, excluding `id` itself.
    pub fn subtree_aggregate_votes(&self, id: NodeId) -> U256 {
        let mut total = U256::ZERO;
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        while let Some(next) = stack.pop() {
            if let Some(node) = self.node(next) {
                total = total.saturating_add(node.edge.votes);
                stack.extend_from_slice(&node.children);
            }
        }
        total
    }

    /// Nodes in level order, table order within a level.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DelegationNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Edges that were excluded during the build.
    pub fn orphans(&self) -> &[OrphanEdge] {
        &self.orphans
    }

    /// Every delegator and delegatee in the tree, first-seen order.
    pub fn parties(&self) -> Vec<Address> {
        let mut seen = std::collections::HashSet::new();
        let mut parties = Vec::new();
        for node in &self.nodes {
            for address in [node.edge.delegator, node.edge.delegatee] {
                if seen.insert(address) {
                    parties.push(address);
                }
            }
        }
        parties
    }
}
