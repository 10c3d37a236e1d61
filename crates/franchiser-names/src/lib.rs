//! Name resolution cache.
//!
//! [`NameCache`] is the single shared store for address → name,
//! name → address and name → avatar lookups. Concurrent requests for the
//! same key share one in-flight call. [`Watch`] is the per-subscriber side:
//! each new key cancels the previous request's [`CancelToken`], so a late
//! result for an abandoned key is dropped instead of shown.

pub mod cache;
pub mod token;
pub mod watch;

pub use cache::{NameCache, SuspectedNames};
pub use token::{CancelToken, TokenSlot};
pub use watch::Watch;
