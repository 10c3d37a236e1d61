//! Delegation tree: reconstruction from the row-per-level table returned by
//! the lens, selection with subtree vote totals, and the view model the
//! front ends draw.

pub mod builder;
pub mod render;
pub mod selection;

pub use builder::{DelegationNode, DelegationTree, NodeId, OrphanEdge, OrphanReason};
pub use render::{render_tree, NameLookup, NodeKind, NodeRole, SortPolicy, ViewNode};
pub use selection::{Selection, SelectionView};
