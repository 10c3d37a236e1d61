//! ENS resolution: forward (name → address), reverse (address → name) and
//! the `avatar` text record.
//!
//! Names are hashed with EIP-137 `namehash` after lower-casing each label.
//! Full UTS-46 normalization is not applied.

use std::sync::Arc;

use alloy_primitives::{keccak256, Address, B256};

use franchiser_types::{DEFAULT_IPFS_GATEWAY, ENS_REGISTRY_ADDRESS, REVERSE_NAME_SUFFIX};

use crate::abi::{decode_address_return, decode_string_return, encode_call, selector, Token};
use crate::{ChainError, ChainFuture, EthCall};

/// Read-only name resolution. "Not found" is `Ok(None)`; errors are transport/decoding failures.
pub trait NameService: Send + Sync {
    /// Primary name for an address.
    fn lookup_address<'a>(&'a self, address: Address) -> ChainFuture<'a, Option<String>>;

    /// Address a name points to.
    fn resolve_name<'a>(&'a self, name: &'a str) -> ChainFuture<'a, Option<Address>>;

    /// Displayable avatar reference (URL or data URI) for a name.
    fn avatar<'a>(&'a self, name: &'a str) -> ChainFuture<'a, Option<String>>;
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.to_lowercase().as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// `<lowercase hex>.addr.reverse`
pub fn reverse_name(address: &Address) -> String {
    format!("{}.{REVERSE_NAME_SUFFIX}", hex::encode(address.as_slice()))
}

/// Turn an `avatar` text record into something displayable.
///
/// HTTP(S) URLs and data URIs pass through, `ipfs://` is mapped onto the
/// gateway. NFT references (`eip155:...`) are not followed.
pub fn avatar_url(record: &str, ipfs_gateway: &str) -> Option<String> {
    let record = record.trim();
    let lower = record.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") || lower.starts_with("data:") {
        return Some(record.to_string());
    }
    if let Some(rest) = record.strip_prefix("ipfs://") {
        let cid = rest.strip_prefix("ipfs/").unwrap_or(rest);
        if cid.is_empty() {
            return None;
        }
        let gateway = ipfs_gateway.trim_end_matches('/');
        return Some(format!("{gateway}/{cid}"));
    }
    None
}

/// ENS client reading the registry and resolvers through an [`EthCall`] transport.
pub struct EnsResolver {
    transport: Arc<dyn EthCall>,
    registry: Address,
    ipfs_gateway: String,
}

impl EnsResolver {
    pub fn new(transport: Arc<dyn EthCall>) -> Self {
        Self {
            transport,
            registry: ENS_REGISTRY_ADDRESS,
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }

    pub fn with_registry(mut self, registry: Address) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_ipfs_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.ipfs_gateway = gateway.into();
        self
    }

    /// Resolver contract for a node; `None` when unset.
    async fn resolver_for(&self, node: B256) -> Result<Option<Address>, ChainError> {
        let data = encode_call(selector("resolver(bytes32)"), &[Token::Bytes32(node)]);
        let output = self.transport.call(self.registry, data).await?;
        let resolver = decode_address_return(&output)?;
        Ok((!resolver.is_zero()).then_some(resolver))
    }

    async fn forward(&self, name: &str) -> Result<Option<Address>, ChainError> {
        let node = namehash(name);
        let Some(resolver) = self.resolver_for(node).await? else {
            return Ok(None);
        };
        let data = encode_call(selector("addr(bytes32)"), &[Token::Bytes32(node)]);
        let output = self.transport.call(resolver, data).await?;
        let address = decode_address_return(&output)?;
        Ok((!address.is_zero()).then_some(address))
    }

    async fn reverse(&self, address: Address) -> Result<Option<String>, ChainError> {
        let node = namehash(&reverse_name(&address));
        let Some(resolver) = self.resolver_for(node).await? else {
            return Ok(None);
        };
        let data = encode_call(selector("name(bytes32)"), &[Token::Bytes32(node)]);
        let output = self.transport.call(resolver, data).await?;
        let name = decode_string_return(&output)?;
        if name.is_empty() {
            return Ok(None);
        }

        // A reverse record is only trusted if the name points back here.
        match self.forward(&name).await? {
            Some(resolved) if resolved == address => Ok(Some(name)),
            other => {
                tracing::debug!(
                    %address,
                    %name,
                    forward = ?other,
                    "Reverse record does not round-trip"
                );
                Ok(None)
            }
        }
    }

    async fn text(&self, name: &str, key: &str) -> Result<Option<String>, ChainError> {
        let node = namehash(name);
        let Some(resolver) = self.resolver_for(node).await? else {
            return Ok(None);
        };
        let data = encode_call(
            selector("text(bytes32,string)"),
            &[Token::Bytes32(node), Token::String(key)],
        );
        let output = self.transport.call(resolver, data).await?;
        let value = decode_string_return(&output)?;
        Ok((!value.is_empty()).then_some(value))
    }
}

impl NameService for EnsResolver {
    fn lookup_address<'a>(&'a self, address: Address) -> ChainFuture<'a, Option<String>> {
        Box::pin(self.reverse(address))
    }

    fn resolve_name<'a>(&'a self, name: &'a str) -> ChainFuture<'a, Option<Address>> {
        Box::pin(self.forward(name))
    }

    fn avatar<'a>(&'a self, name: &'a str) -> ChainFuture<'a, Option<String>> {
        Box::pin(async move {
            let record = self.text(name, "avatar").await?;
            Ok(record.and_then(|r| avatar_url(&r, &self.ipfs_gateway)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
        assert_eq!(namehash("Foo.ETH"), namehash("foo.eth"));
    }

    #[test]
    fn test_reverse_name() {
        let address = alloy_primitives::address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert_eq!(
            reverse_name(&address),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045.addr.reverse"
        );
    }

    #[test]
    fn test_avatar_url() {
        let gw = "https://ipfs.io/ipfs/";
        assert_eq!(
            avatar_url("https://example.com/a.png", gw).as_deref(),
            Some("https://example.com/a.png")
        );
        assert_eq!(
            avatar_url("ipfs://QmHash", gw).as_deref(),
            Some("https://ipfs.io/ipfs/QmHash")
        );
        assert_eq!(
            avatar_url("ipfs://ipfs/QmHash", gw).as_deref(),
            Some("https://ipfs.io/ipfs/QmHash")
        );
        assert!(avatar_url("data:image/png;base64,AAAA", gw).is_some());
        let nft = "eip155:1/erc721:0xb47e3cd837dDF8e4c57F05d70Ab865de6e193BBB/1";
        assert!(avatar_url(nft, gw).is_none());
        assert!(avatar_url("", gw).is_none());
    }
}
