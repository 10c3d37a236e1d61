//! Keyed, cancellable view over one [`NameCache`] lookup.
//!
//! A `Watch` holds at most one key. Changing the key clears the value and
//! starts a new lookup; a lookup that completes after its key was replaced
//! never reaches the value.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use franchiser_types::Address;

use crate::{CancelToken, NameCache, TokenSlot};

type LookupFn<K, V> = dyn Fn(Arc<NameCache>, K) -> BoxFuture<'static, Option<V>> + Send + Sync;

struct WatchState<K> {
    key: Option<K>,
    token: TokenSlot,
}

pub struct Watch<K, V> {
    cache: Arc<NameCache>,
    lookup: Arc<LookupFn<K, V>>,
    state: Arc<Mutex<WatchState<K>>>,
    tx: Arc<watch::Sender<Option<V>>>,
}

fn lock<K>(state: &Mutex<WatchState<K>>) -> MutexGuard<'_, WatchState<K>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Watch<Address, String> {
    /// Display name for an address.
    pub fn name(cache: Arc<NameCache>) -> Self {
        Self::new(cache, |cache, address| {
            async move { cache.resolve_name_for_address(address).await }.boxed()
        })
    }
}

impl Watch<String, Address> {
    /// Address for a name.
    pub fn address(cache: Arc<NameCache>) -> Self {
        Self::new(cache, |cache, name| {
            async move { cache.resolve_address_for_name(&name).await }.boxed()
        })
    }
}

impl Watch<String, String> {
    /// Avatar for a name.
    pub fn avatar(cache: Arc<NameCache>) -> Self {
        Self::new(cache, |cache, name| {
            async move { cache.resolve_avatar_for_name(&name).await }.boxed()
        })
    }
}

impl<K, V> Watch<K, V>
where
    K: Clone + PartialEq + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new<F>(cache: Arc<NameCache>, lookup: F) -> Self
    where
        F: Fn(Arc<NameCache>, K) -> BoxFuture<'static, Option<V>> + Send + Sync + 'static,
    {
        let (tx, _rx) = watch::channel(None);
        Self {
            cache,
            lookup: Arc::new(lookup),
            state: Arc::new(Mutex::new(WatchState { key: None, token: TokenSlot::new() })),
            tx: Arc::new(tx),
        }
    }

    /// Point the watch at a new key.
    ///
    /// Setting the current key again is a no-op and returns `None`. Otherwise
    /// the value is cleared immediately and, for `Some` key, the handle of the
    /// spawned lookup is returned. Must be called inside a tokio runtime.
    pub fn set(&self, key: Option<K>) -> Option<JoinHandle<()>> {
        let token = {
            let mut state = lock(&self.state);
            if state.key == key {
                return None;
            }
            state.key = key.clone();
            self.tx.send_replace(None);
            match key {
                Some(_) => state.token.issue(),
                None => {
                    state.token.cancel();
                    return None;
                }
            }
        };
        let key = key?;
        Some(self.spawn(key, token))
    }

    /// Re-run the lookup for the current key without clearing the value.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        let (key, token) = {
            let mut state = lock(&self.state);
            let key = state.key.clone()?;
            (key, state.token.issue())
        };
        Some(self.spawn(key, token))
    }

    fn spawn(&self, key: K, token: CancelToken) -> JoinHandle<()> {
        let lookup = (self.lookup)(Arc::clone(&self.cache), key);
        let state = Arc::clone(&self.state);
        let tx = Arc::clone(&self.tx);
        tokio::spawn(async move {
            let value = lookup.await;
            // Checked under the state lock so a concurrent `set` cannot slip
            // between the check and the send.
            let _state = lock(&state);
            if token.is_cancelled() {
                return;
            }
            tx.send_replace(value);
        })
    }

    /// Current value; `None` while loading or when nothing was found.
    pub fn get(&self) -> Option<V> {
        self.tx.borrow().clone()
    }

    pub fn key(&self) -> Option<K> {
        lock(&self.state).key.clone()
    }

    /// Receiver notified on every value change.
    pub fn subscribe(&self) -> watch::Receiver<Option<V>> {
        self.tx.subscribe()
    }
}

impl<K, V> Drop for Watch<K, V> {
    fn drop(&mut self) {
        lock(&self.state).token.cancel();
    }
}
