//! Delegation data: the Franchiser lens contract and the fetcher in front of it.

use std::sync::Arc;

use alloy_primitives::Address;

use franchiser_types::DelegationTable;

use crate::abi::{decode_delegation_table, encode_call, selector, Token};
use crate::{ChainError, ChainFuture, EthCall};

/// Signature of the lens view function.
pub const GET_ALL_DELEGATIONS: &str = "getAllDelegations(address,address)";

/// Source of the full delegation table between an owner and a delegatee.
pub trait DelegationSource: Send + Sync {
    fn get_all_delegations<'a>(
        &'a self,
        owner: Address,
        delegatee: Address,
    ) -> ChainFuture<'a, DelegationTable>;
}

/// The on-chain lens contract, queried with a single `eth_call`.
pub struct FranchiserLens {
    transport: Arc<dyn EthCall>,
    address: Address,
}

impl FranchiserLens {
    pub fn new(transport: Arc<dyn EthCall>, address: Address) -> Self {
        Self { transport, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl DelegationSource for FranchiserLens {
    fn get_all_delegations<'a>(
        &'a self,
        owner: Address,
        delegatee: Address,
    ) -> ChainFuture<'a, DelegationTable> {
        Box::pin(async move {
            let data = encode_call(
                selector(GET_ALL_DELEGATIONS),
                &[Token::Address(owner), Token::Address(delegatee)],
            );
            let output = self.transport.call(self.address, data).await?;
            decode_delegation_table(&output)
        })
    }
}

/// Issues the delegation query and folds every failure into an empty table.
///
/// Callers therefore see "no delegations" for reverts (including "no route")
/// and network errors alike.
#[derive(Clone)]
pub struct DelegationFetcher {
    source: Arc<dyn DelegationSource>,
}

impl DelegationFetcher {
    pub fn new(source: Arc<dyn DelegationSource>) -> Self {
        Self { source }
    }

    pub async fn try_fetch_all_delegations(
        &self,
        owner: Address,
        delegatee: Address,
    ) -> Result<DelegationTable, ChainError> {
        self.source.get_all_delegations(owner, delegatee).await
    }

    pub async fn fetch_all_delegations(
        &self,
        owner: Address,
        delegatee: Address,
    ) -> DelegationTable {
        match self.try_fetch_all_delegations(owner, delegatee).await {
            Ok(table) => {
                tracing::debug!(
                    %owner,
                    %delegatee,
                    rows = table.rows().len(),
                    edges = table.edge_count(),
                    "Fetched delegation table"
                );
                table
            }
            Err(e) => {
                tracing::warn!(%owner, %delegatee, error = %e, "Delegation query failed");
                DelegationTable::empty()
            }
        }
    }
}
