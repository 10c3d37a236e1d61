//! JSON-RPC 2.0 client over HTTP.
//!
//! Only the two read methods the viewer needs: `eth_call` against the latest
//! block and `eth_chainId`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ChainError, ChainFuture};

/// Default timeout for a single RPC round-trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport for read-only contract calls.
pub trait EthCall: Send + Sync {
    /// Execute `data` against contract `to` and return the raw return data.
    fn call<'a>(&'a self, to: Address, data: Vec<u8>) -> ChainFuture<'a, Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client for an Ethereum node.
pub struct JsonRpcClient {
    http_client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeouts(url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeouts(
        url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest { jsonrpc: "2.0", id, method, params };

        tracing::trace!(id, method, "RPC request");
        let response = self.http_client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ChainError::Transport(format!("HTTP status {}", response.status())));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| {
                ChainError::InvalidResponse(format!("failed to parse RPC response: {e}"))
            })?;

        if let Some(error) = parsed.error {
            return Err(map_rpc_error(error.code, error.message));
        }
        parsed
            .result
            .ok_or_else(|| ChainError::InvalidResponse(format!("{method}: missing result")))
    }

    /// `eth_call` at the latest block.
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let raw: String = self.request("eth_call", call_params(to, data)).await?;
        parse_hex_data(&raw)
    }

    /// `eth_chainId` as a number.
    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let raw: String = self.request("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(&raw)
    }
}

impl EthCall for JsonRpcClient {
    fn call<'a>(&'a self, to: Address, data: Vec<u8>) -> ChainFuture<'a, Vec<u8>> {
        Box::pin(async move { self.eth_call(to, &data).await })
    }
}

fn call_params(to: Address, data: &[u8]) -> serde_json::Value {
    serde_json::json!([
        { "to": to.to_checksum(None), "data": format!("0x{}", hex::encode(data)) },
        "latest"
    ])
}

fn map_rpc_error(code: i64, message: String) -> ChainError {
    if message.to_ascii_lowercase().contains("revert") {
        ChainError::Reverted(message)
    } else {
        ChainError::Rpc { code, message }
    }
}

fn parse_hex_data(raw: &str) -> Result<Vec<u8>, ChainError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| ChainError::InvalidResponse(format!("bad hex data: {e}")))
}

fn parse_quantity(raw: &str) -> Result<u64, ChainError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("bad quantity '{raw}': {e}")))
}
