//! Delegation edges and the row-ordered table the lens contract returns.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// `delegator` has delegated `votes` to `delegatee` through the `franchiser` contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationEdge {
    pub delegator: Address,
    pub delegatee: Address,
    /// Unique per edge within one table; used as the node key.
    pub franchiser: Address,
    pub votes: U256,
}

impl DelegationEdge {
    pub fn new(delegator: Address, delegatee: Address, franchiser: Address, votes: U256) -> Self {
        Self { delegator, delegatee, franchiser, votes }
    }
}

/// Breadth-first levels of a delegation chain, exactly as the source returns them.
///
/// Row 0 holds the owner → delegatee edge. Row `i + 1` holds the edges whose
/// delegator is a delegatee of row `i`; parent links are not encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelegationTable(pub Vec<Vec<DelegationEdge>>);

impl DelegationTable {
    pub fn new(rows: Vec<Vec<DelegationEdge>>) -> Self {
        Self(rows)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn rows(&self) -> &[Vec<DelegationEdge>] {
        &self.0
    }

    /// The owner → delegatee edge, if there is one.
    pub fn root(&self) -> Option<&DelegationEdge> {
        self.0.first().and_then(|row| row.first())
    }

    /// True when there is nothing to show: no rows, or an empty row 0.
    pub fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    pub fn edge_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    /// Every address that appears as a delegator or delegatee, first-seen order.
    pub fn parties(&self) -> Vec<Address> {
        let mut seen = std::collections::HashSet::new();
        let mut parties = Vec::new();
        for edge in self.0.iter().flatten() {
            for address in [edge.delegator, edge.delegatee] {
                if seen.insert(address) {
                    parties.push(address);
                }
            }
        }
        parties
    }
}

impl From<Vec<Vec<DelegationEdge>>> for DelegationTable {
    fn from(rows: Vec<Vec<DelegationEdge>>) -> Self {
        Self(rows)
    }
}
