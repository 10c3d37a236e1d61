//! Shared, coalescing cache over a [`NameService`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};

use franchiser_chain::{ChainError, NameService};
use franchiser_types::Address;

/// Known address → name pairs tried when an address has no reverse record.
///
/// A candidate is only accepted if it forward-resolves back to the address.
#[derive(Debug, Clone, Default)]
pub struct SuspectedNames(HashMap<Address, String>);

impl SuspectedNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address, name: impl Into<String>) {
        self.0.insert(address, name.into());
    }

    pub fn get(&self, address: &Address) -> Option<&str> {
        self.0.get(address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Address, String)> for SuspectedNames {
    fn from_iter<I: IntoIterator<Item = (Address, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of one lookup. `Failed` is reported as "no value" but not cached.
#[derive(Debug, Clone)]
enum Outcome<V> {
    Found(V),
    Missing,
    Failed,
}

impl<V> Outcome<V> {
    fn from_result(result: Result<Option<V>, ChainError>, what: &str, key: &str) -> Self {
        match result {
            Ok(Some(value)) => Outcome::Found(value),
            Ok(None) => Outcome::Missing,
            Err(e) => {
                tracing::debug!(lookup = what, key, error = %e, "Name lookup failed");
                Outcome::Failed
            }
        }
    }

    fn into_option(self) -> Option<V> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::Missing | Outcome::Failed => None,
        }
    }
}

type SharedLookup<V> = Shared<BoxFuture<'static, Outcome<V>>>;

enum Slot<V> {
    /// In flight; `generation` identifies this particular request.
    Pending { generation: u64, lookup: SharedLookup<V> },
    Ready(Option<V>),
}

/// One keyed table of cached lookups.
struct LookupTable<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    next_generation: AtomicU64,
}

impl<K, V> LookupTable<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value, join the in-flight lookup, or start one.
    async fn get_or_fetch<F>(&self, key: K, fetch: F) -> Outcome<V>
    where
        F: FnOnce() -> BoxFuture<'static, Outcome<V>> + Send,
    {
        let (generation, lookup) = {
            let mut slots = self.slots();
            match slots.entry(key.clone()) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Ready(Some(value)) => return Outcome::Found(value.clone()),
                    Slot::Ready(None) => return Outcome::Missing,
                    Slot::Pending { generation, lookup } => (*generation, lookup.clone()),
                },
                Entry::Vacant(entry) => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let lookup = fetch().shared();
                    entry.insert(Slot::Pending { generation, lookup: lookup.clone() });
                    (generation, lookup)
                }
            }
        };

        let outcome = lookup.await;

        {
            let mut slots = self.slots();
            // Only the request that created the slot may settle it; an
            // invalidation while in flight discards the result.
            let ours = matches!(
                slots.get(&key),
                Some(Slot::Pending { generation: g, .. }) if *g == generation
            );
            if ours {
                match &outcome {
                    Outcome::Found(value) => {
                        slots.insert(key, Slot::Ready(Some(value.clone())));
                    }
                    Outcome::Missing => {
                        slots.insert(key, Slot::Ready(None));
                    }
                    Outcome::Failed => {
                        slots.remove(&key);
                    }
                }
            }
        }

        outcome
    }

    fn peek(&self, key: &K) -> Option<V> {
        match self.slots().get(key) {
            Some(Slot::Ready(value)) => value.clone(),
            _ => None,
        }
    }

    fn is_settled(&self, key: &K) -> bool {
        matches!(self.slots().get(key), Some(Slot::Ready(_)))
    }

    fn invalidate(&self, key: &K) {
        self.slots().remove(key);
    }

    fn clear(&self) {
        self.slots().clear();
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Single point of truth for name, address and avatar lookups.
///
/// Construct once per process and share behind an `Arc`.
pub struct NameCache {
    service: Arc<dyn NameService>,
    suspected: SuspectedNames,
    names: LookupTable<Address, String>,
    addresses: LookupTable<String, Address>,
    avatars: LookupTable<String, String>,
}

impl NameCache {
    pub fn new(service: Arc<dyn NameService>, suspected: SuspectedNames) -> Self {
        Self {
            service,
            suspected,
            names: LookupTable::new(),
            addresses: LookupTable::new(),
            avatars: LookupTable::new(),
        }
    }

    /// Display name for an address: its verified reverse record, else a
    /// suspected name that forward-resolves to it.
    pub async fn resolve_name_for_address(self: &Arc<Self>, address: Address) -> Option<String> {
        let this = Arc::clone(self);
        self.names
            .get_or_fetch(address, move || {
                async move {
                    let reverse = async {
                        let key = address.to_string();
                        let result = this.service.lookup_address(address).await;
                        Outcome::from_result(result, "reverse", &key)
                    };
                    let (reverse, suspected) =
                        future::join(reverse, this.verify_suspected(address)).await;

                    match (reverse, suspected) {
                        (Outcome::Found(name), _) | (_, Outcome::Found(name)) => {
                            Outcome::Found(name)
                        }
                        (Outcome::Failed, _) | (_, Outcome::Failed) => Outcome::Failed,
                        (Outcome::Missing, Outcome::Missing) => Outcome::Missing,
                    }
                }
                .boxed()
            })
            .await
            .into_option()
    }

    async fn verify_suspected(self: &Arc<Self>, address: Address) -> Outcome<String> {
        let Some(candidate) = self.suspected.get(&address).map(str::to_string) else {
            return Outcome::Missing;
        };
        match self.forward(&candidate).await {
            Outcome::Found(resolved) if resolved == address => Outcome::Found(candidate),
            Outcome::Found(resolved) => {
                tracing::debug!(%address, %candidate, %resolved, "Suspected name points elsewhere");
                Outcome::Missing
            }
            Outcome::Missing => Outcome::Missing,
            Outcome::Failed => Outcome::Failed,
        }
    }

    async fn forward(self: &Arc<Self>, name: &str) -> Outcome<Address> {
        let key = name_key(name);
        let this = Arc::clone(self);
        let lookup_key = key.clone();
        self.addresses
            .get_or_fetch(key, move || {
                async move {
                    let result = this.service.resolve_name(&lookup_key).await;
                    Outcome::from_result(result, "forward", &lookup_key)
                }
                .boxed()
            })
            .await
    }

    /// Address a name points to.
    pub async fn resolve_address_for_name(self: &Arc<Self>, name: &str) -> Option<Address> {
        if name_key(name).is_empty() {
            return None;
        }
        self.forward(name).await.into_option()
    }

    /// Avatar reference for a name.
    pub async fn resolve_avatar_for_name(self: &Arc<Self>, name: &str) -> Option<String> {
        let key = name_key(name);
        if key.is_empty() {
            return None;
        }
        let this = Arc::clone(self);
        let lookup_key = key.clone();
        self.avatars
            .get_or_fetch(key, move || {
                async move {
                    let result = this.service.avatar(&lookup_key).await;
                    Outcome::from_result(result, "avatar", &lookup_key)
                }
                .boxed()
            })
            .await
            .into_option()
    }

    /// Name then avatar for an address, both through the cache.
    pub async fn resolve_avatar_for_address(self: &Arc<Self>, address: Address) -> Option<String> {
        let name = self.resolve_name_for_address(address).await?;
        self.resolve_avatar_for_name(&name).await
    }

    /// Cached name for an address, without issuing a lookup.
    pub fn peek_name(&self, address: &Address) -> Option<String> {
        self.names.peek(address)
    }

    /// Cached address for a name, without issuing a lookup.
    pub fn peek_address(&self, name: &str) -> Option<Address> {
        self.addresses.peek(&name_key(name))
    }

    /// Cached avatar for an address's cached name, without issuing a lookup.
    pub fn peek_avatar(&self, address: &Address) -> Option<String> {
        let name = self.peek_name(address)?;
        self.avatars.peek(&name_key(&name))
    }

    /// Whether a name lookup for this address has completed (found or not).
    pub fn is_name_settled(&self, address: &Address) -> bool {
        self.names.is_settled(address)
    }

    /// Forget everything known about an address so the next request refetches.
    pub fn invalidate(&self, address: &Address) {
        let cached = self.names.peek(address);
        let suspected = self.suspected.get(address).map(str::to_string);
        for name in cached.iter().chain(suspected.iter()) {
            let key = name_key(name);
            self.addresses.invalidate(&key);
            self.avatars.invalidate(&key);
        }
        self.names.invalidate(address);
    }

    pub fn clear(&self) {
        self.names.clear();
        self.addresses.clear();
        self.avatars.clear();
    }
}
