//! Franchiser chain access.
//!
//! Two read-only external services sit behind object-safe traits:
//! [`DelegationSource`] (the Franchiser lens contract) and [`NameService`]
//! (ENS). Both are reached through an [`EthCall`] transport, normally the
//! [`JsonRpcClient`]; [`MockChain`] replaces the whole stack in tests.

pub mod abi;
pub mod ens;
pub mod error;
pub mod lens;
pub mod mock;
pub mod rpc;

use std::future::Future;
use std::pin::Pin;

pub use ens::{avatar_url, namehash, reverse_name, EnsResolver, NameService};
pub use error::ChainError;
pub use lens::{DelegationFetcher, DelegationSource, FranchiserLens};
pub use mock::{MockChain, MockOp};
pub use rpc::{EthCall, JsonRpcClient};

/// Boxed future returned by the service traits.
pub type ChainFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ChainError>> + Send + 'a>>;
