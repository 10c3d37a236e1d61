//! Franchiser types - addresses, delegation edges and vote amounts.
//!
//! Everything here is pure: no I/O, no async. The chain, cache and tree
//! crates build on these definitions.

pub mod address;
pub mod constants;
pub mod delegation;
pub mod error;
pub mod units;

pub use address::*;
pub use constants::*;
pub use delegation::*;
pub use error::*;
pub use units::*;

pub use alloy_primitives::{Address, U256};
