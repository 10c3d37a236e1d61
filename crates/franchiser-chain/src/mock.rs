//! In-memory chain for tests and offline demos.
//!
//! Implements both [`DelegationSource`] and [`NameService`]. Individual keys
//! can be made to fail, or held until a [`Notify`] fires so tests can script
//! out-of-order completion.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::Address;
use tokio::sync::Notify;

use franchiser_types::{to_checksum_text, DelegationTable};

use crate::{ChainError, ChainFuture, DelegationSource, NameService};

/// Operations the mock can fail, hold or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Delegations,
    Reverse,
    Forward,
    Avatar,
}

#[derive(Default)]
struct MockData {
    delegations: HashMap<(Address, Address), DelegationTable>,
    reverse: HashMap<Address, String>,
    forward: HashMap<String, Address>,
    avatars: HashMap<String, String>,
    failing: HashSet<(MockOp, String)>,
    holds: HashMap<(MockOp, String), Arc<Notify>>,
}

#[derive(Default)]
pub struct MockChain {
    data: Mutex<MockData>,
    delegation_calls: AtomicUsize,
    reverse_calls: AtomicUsize,
    forward_calls: AtomicUsize,
    avatar_calls: AtomicUsize,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn address_key(address: &Address) -> String {
    to_checksum_text(address)
}

fn pair_key(owner: &Address, delegatee: &Address) -> String {
    format!("{}/{}", address_key(owner), address_key(delegatee))
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_delegations(
        self,
        owner: Address,
        delegatee: Address,
        table: DelegationTable,
    ) -> Self {
        self.data().delegations.insert((owner, delegatee), table);
        self
    }

    /// Reverse record for `address`.
    pub fn with_reverse(self, address: Address, name: &str) -> Self {
        self.data().reverse.insert(address, name.to_string());
        self
    }

    /// Forward record for `name`.
    pub fn with_forward(self, name: &str, address: Address) -> Self {
        self.data().forward.insert(name_key(name), address);
        self
    }

    /// Both directions at once.
    pub fn with_name(self, address: Address, name: &str) -> Self {
        self.with_reverse(address, name).with_forward(name, address)
    }

    pub fn with_avatar(self, name: &str, avatar: &str) -> Self {
        self.data().avatars.insert(name_key(name), avatar.to_string());
        self
    }

    pub fn set_delegations(&self, owner: Address, delegatee: Address, table: DelegationTable) {
        self.data().delegations.insert((owner, delegatee), table);
    }

    /// Make lookups of `op` for an address fail with a transport error.
    pub fn fail_address(&self, op: MockOp, address: &Address) {
        self.data().failing.insert((op, address_key(address)));
    }

    /// Make lookups of `op` for a name fail with a transport error.
    pub fn fail_name(&self, op: MockOp, name: &str) {
        self.data().failing.insert((op, name_key(name)));
    }

    /// Undo every scripted failure.
    pub fn clear_failures(&self) {
        self.data().failing.clear();
    }

    /// Make the delegation query for this pair revert.
    pub fn fail_delegations(&self, owner: &Address, delegatee: &Address) {
        self.data().failing.insert((MockOp::Delegations, pair_key(owner, delegatee)));
    }

    /// Hold lookups of `op` for an address until the returned handle is notified.
    pub fn hold_address(&self, op: MockOp, address: &Address) -> Arc<Notify> {
        self.hold(op, address_key(address))
    }

    pub fn hold_name(&self, op: MockOp, name: &str) -> Arc<Notify> {
        self.hold(op, name_key(name))
    }

    pub fn hold_delegations(&self, owner: &Address, delegatee: &Address) -> Arc<Notify> {
        self.hold(MockOp::Delegations, pair_key(owner, delegatee))
    }

    fn hold(&self, op: MockOp, key: String) -> Arc<Notify> {
        self.data()
            .holds
            .entry((op, key))
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Number of calls made for `op`.
    pub fn calls(&self, op: MockOp) -> usize {
        self.counter(op).load(Ordering::SeqCst)
    }

    fn counter(&self, op: MockOp) -> &AtomicUsize {
        match op {
            MockOp::Delegations => &self.delegation_calls,
            MockOp::Reverse => &self.reverse_calls,
            MockOp::Forward => &self.forward_calls,
            MockOp::Avatar => &self.avatar_calls,
        }
    }

    /// Count the call, wait on any hold, then report a scripted failure.
    async fn enter(&self, op: MockOp, key: &str) -> Result<(), ChainError> {
        self.counter(op).fetch_add(1, Ordering::SeqCst);
        let hold = self.data().holds.get(&(op, key.to_string())).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if self.data().failing.contains(&(op, key.to_string())) {
            return Err(ChainError::Transport(format!("mock failure for {op:?} {key}")));
        }
        Ok(())
    }
}

impl DelegationSource for MockChain {
    fn get_all_delegations<'a>(
        &'a self,
        owner: Address,
        delegatee: Address,
    ) -> ChainFuture<'a, DelegationTable> {
        Box::pin(async move {
            self.enter(MockOp::Delegations, &pair_key(&owner, &delegatee)).await?;
            self.data()
                .delegations
                .get(&(owner, delegatee))
                .cloned()
                .ok_or_else(|| ChainError::Reverted("no route".into()))
        })
    }
}

impl NameService for MockChain {
    fn lookup_address<'a>(&'a self, address: Address) -> ChainFuture<'a, Option<String>> {
        Box::pin(async move {
            self.enter(MockOp::Reverse, &address_key(&address)).await?;
            Ok(self.data().reverse.get(&address).cloned())
        })
    }

    fn resolve_name<'a>(&'a self, name: &'a str) -> ChainFuture<'a, Option<Address>> {
        Box::pin(async move {
            let key = name_key(name);
            self.enter(MockOp::Forward, &key).await?;
            Ok(self.data().forward.get(&key).copied())
        })
    }

    fn avatar<'a>(&'a self, name: &'a str) -> ChainFuture<'a, Option<String>> {
        Box::pin(async move {
            let key = name_key(name);
            self.enter(MockOp::Avatar, &key).await?;
            Ok(self.data().avatars.get(&key).cloned())
        })
    }
}
