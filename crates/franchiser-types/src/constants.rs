use alloy_primitives::{address, Address};

/// Decimals of the governance token whose votes are delegated.
pub const VOTE_DECIMALS: usize = 18;

/// Chain the Franchiser contracts are deployed on.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// ENS registry, identical on mainnet and the public testnets.
pub const ENS_REGISTRY_ADDRESS: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Suffix of the reverse-record namespace.
pub const REVERSE_NAME_SUFFIX: &str = "addr.reverse";

/// Block explorer page prefix for an address.
pub const ETHERSCAN_ADDRESS_URL: &str = "https://etherscan.io/address/";

/// Public IPFS gateway used to turn `ipfs://` avatar references into URLs.
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
