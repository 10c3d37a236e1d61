//! The service object front ends talk to.
//!
//! Holds the current owner/delegatee pair, the tree built for it and the
//! selection. Fetches are cancellable: changing the pair supersedes any
//! fetch still in flight, and its result is dropped when it arrives.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::Address;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;

use franchiser_chain::DelegationFetcher;
use franchiser_names::{CancelToken, NameCache, TokenSlot};
use franchiser_tree::{render_tree, DelegationTree, Selection, SelectionView, SortPolicy, ViewNode};
use franchiser_types::{is_name_like, normalize_address, to_checksum_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStatus {
    /// Owner or delegatee missing.
    Idle,
    Loading,
    NoData,
    Ready,
}

impl std::fmt::Display for TreeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Loading => "Loading",
            Self::NoData => "No delegations found",
            Self::Ready => "Ready",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub status: TreeStatus,
    pub owner: Option<Address>,
    pub delegatee: Option<Address>,
    pub tree: Option<Arc<DelegationTree>>,
    /// Bumped on every new fetch; lets callers notice a rebuilt tree.
    pub generation: u64,
}

struct ExplorerState {
    owner: Option<Address>,
    delegatee: Option<Address>,
    status: TreeStatus,
    tree: Option<Arc<DelegationTree>>,
    selection: Selection,
    fetch: TokenSlot,
    generation: u64,
}

pub struct Explorer {
    fetcher: DelegationFetcher,
    names: Arc<NameCache>,
    state: Arc<Mutex<ExplorerState>>,
}

fn lock(state: &Mutex<ExplorerState>) -> MutexGuard<'_, ExplorerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Explorer {
    pub fn new(fetcher: DelegationFetcher, names: Arc<NameCache>) -> Self {
        Self {
            fetcher,
            names,
            state: Arc::new(Mutex::new(ExplorerState {
                owner: None,
                delegatee: None,
                status: TreeStatus::Idle,
                tree: None,
                selection: Selection::new(),
                fetch: TokenSlot::new(),
                generation: 0,
            })),
        }
    }

    pub fn names(&self) -> &Arc<NameCache> {
        &self.names
    }

    /// Point the explorer at a new pair.
    ///
    /// An unchanged pair is a no-op. With both parties present a fetch is
    /// spawned and its handle returned; otherwise the explorer goes idle.
    pub fn set_parties(
        &self,
        owner: Option<Address>,
        delegatee: Option<Address>,
    ) -> Option<JoinHandle<()>> {
        {
            let state = lock(&self.state);
            if state.owner == owner
                && state.delegatee == delegatee
                && state.status != TreeStatus::Idle
            {
                return None;
            }
        }
        self.start(owner, delegatee)
    }

    /// Refetch the current pair and forget the names cached for its tree.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        let (owner, delegatee, tree) = {
            let state = lock(&self.state);
            (state.owner, state.delegatee, state.tree.clone())
        };
        if let Some(tree) = tree {
            for address in tree.parties() {
                self.names.invalidate(&address);
            }
        }
        self.start(owner, delegatee)
    }

    fn start(&self, owner: Option<Address>, delegatee: Option<Address>) -> Option<JoinHandle<()>> {
        let (token, generation) = {
            let mut state = lock(&self.state);
            state.owner = owner;
            state.delegatee = delegatee;
            state.tree = None;
            state.selection.clear();
            state.generation += 1;
            if owner.is_none() || delegatee.is_none() {
                state.fetch.cancel();
                state.status = TreeStatus::Idle;
                return None;
            }
            state.status = TreeStatus::Loading;
            (state.fetch.issue(), state.generation)
        };
        let (owner, delegatee) = (owner?, delegatee?);
        tracing::debug!(%owner, %delegatee, generation, "Fetching delegations");
        Some(self.spawn_fetch(owner, delegatee, token))
    }

    fn spawn_fetch(
        &self,
        owner: Address,
        delegatee: Address,
        token: CancelToken,
    ) -> JoinHandle<()> {
        let fetcher = self.fetcher.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let table = fetcher.fetch_all_delegations(owner, delegatee).await;
            let tree = DelegationTree::build(&table).map(Arc::new);

            let mut state = lock(&state);
            if token.is_cancelled() {
                tracing::debug!(%owner, %delegatee, "Dropping superseded delegation result");
                return;
            }
            match tree {
                Some(tree) => {
                    state.selection = Selection::for_tree(&tree);
                    state.status = TreeStatus::Ready;
                    state.tree = Some(tree);
                }
                None => {
                    state.status = TreeStatus::NoData;
                    state.tree = None;
                }
            }
        })
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let state = lock(&self.state);
        TreeSnapshot {
            status: state.status,
            owner: state.owner,
            delegatee: state.delegatee,
            tree: state.tree.clone(),
            generation: state.generation,
        }
    }

    /// Select an edge of the current tree. False when there is no tree or
    /// the franchiser is not part of it.
    pub fn select(&self, franchiser: Address) -> bool {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        match &state.tree {
            Some(tree) => state.selection.select(tree, franchiser),
            None => false,
        }
    }

    pub fn selection(&self) -> Option<SelectionView> {
        let state = lock(&self.state);
        state.selection.view(state.tree.as_deref()?)
    }

    /// Cached name, or the checksummed address. Never issues a lookup.
    pub fn display_name_for(&self, address: &Address) -> String {
        self.names
            .peek_name(address)
            .unwrap_or_else(|| to_checksum_text(address))
    }

    /// Resolve names and avatars for every party in the current tree.
    pub fn request_names(&self) -> Option<JoinHandle<()>> {
        let (tree, owner, delegatee) = {
            let state = lock(&self.state);
            (state.tree.clone(), state.owner, state.delegatee)
        };
        let mut parties = tree.map(|t| t.parties()).unwrap_or_default();
        for address in [owner, delegatee].into_iter().flatten() {
            if !parties.contains(&address) {
                parties.push(address);
            }
        }
        if parties.is_empty() {
            return None;
        }

        let names = Arc::clone(&self.names);
        Some(tokio::spawn(async move {
            let lookups = parties.into_iter().map(|address| {
                let names = Arc::clone(&names);
                async move { names.resolve_avatar_for_address(address).await }
            });
            join_all(lookups).await;
        }))
    }

    pub fn view(&self, policy: SortPolicy) -> Option<ViewNode> {
        let state = lock(&self.state);
        let tree = state.tree.as_deref()?;
        Some(render_tree(tree, self.names.as_ref(), state.selection.selected(), policy))
    }

    /// Parse user input naming a party: address text, or an ENS name.
    pub async fn resolve_party(&self, text: &str) -> Option<Address> {
        let text = text.trim();
        if is_name_like(text) {
            self.names.resolve_address_for_name(text).await
        } else {
            normalize_address(text)
        }
    }
}
