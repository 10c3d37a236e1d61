//! Viewer configuration with TOML file support.
//!
//! Lookup order: an explicit `--config` path, then
//! `<config_dir>/franchiser/config.toml`, then built-in defaults. The
//! `FRANCHISER_RPC_URL` environment variable overrides `rpc_url` from any
//! of them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use franchiser_names::SuspectedNames;
use franchiser_tree::SortPolicy;
use franchiser_types::{parse_address, DEFAULT_IPFS_GATEWAY, ENS_REGISTRY_ADDRESS, MAINNET_CHAIN_ID};

use crate::logging::LogFormat;

pub const RPC_URL_ENV: &str = "FRANCHISER_RPC_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// JSON-RPC endpoint of an Ethereum node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Chain the endpoint is expected to serve; checked at startup.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Deployed lens contract. Required unless running the demo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_address: Option<Address>,

    #[serde(default = "default_ens_registry")]
    pub ens_registry: Address,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Gateway prefix for `ipfs://` avatars.
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,

    #[serde(default)]
    pub sort_policy: SortPolicy,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Address → name candidates tried when an address has no reverse record.
    #[serde(default)]
    pub suspected_names: BTreeMap<String, String>,
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_chain_id() -> u64 {
    MAINNET_CHAIN_ID
}

fn default_ens_registry() -> Address {
    ENS_REGISTRY_ADDRESS
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_ipfs_gateway() -> String {
    DEFAULT_IPFS_GATEWAY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            lens_address: None,
            ens_registry: default_ens_registry(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            ipfs_gateway: default_ipfs_gateway(),
            sort_policy: SortPolicy::default(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            suspected_names: BTreeMap::new(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// `<config_dir>/franchiser/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("franchiser").join("config.toml"))
    }

    /// Load from `explicit`, else the default path if it exists, else defaults;
    /// then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_toml_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_toml_file(&path)?,
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(RPC_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.rpc_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least one second".into()));
        }
        self.log_format()?;
        self.suspected()?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log_format.parse::<LogFormat>().map_err(ConfigError::Invalid)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The `suspected_names` table with parsed addresses.
    pub fn suspected(&self) -> Result<SuspectedNames, ConfigError> {
        self.suspected_names
            .iter()
            .map(|(address, name)| {
                parse_address(address)
                    .map(|a| (a, name.trim().to_string()))
                    .map_err(|e| {
                        ConfigError::Invalid(format!("suspected_names key '{address}': {e}"))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.log_format, "human");
        assert!(config.lens_address.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = ViewerConfig {
            sort_policy: SortPolicy::FirstChar,
            ..ViewerConfig::default()
        };
        let parsed = ViewerConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_env_overrides_rpc_url() {
        let config = ViewerConfig::default().with_env_overrides(|key| {
            (key == RPC_URL_ENV).then(|| "https://rpc.example".to_string())
        });
        assert_eq!(config.rpc_url, "https://rpc.example");

        let untouched = ViewerConfig::default().with_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(untouched.rpc_url, default_rpc_url());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let empty_url = ViewerConfig { rpc_url: " ".into(), ..ViewerConfig::default() };
        assert!(matches!(empty_url.validate(), Err(ConfigError::Invalid(_))));

        let bad_format = ViewerConfig { log_format: "xml".into(), ..ViewerConfig::default() };
        assert!(bad_format.validate().is_err());

        let mut bad_suspect = ViewerConfig::default();
        bad_suspect.suspected_names.insert("0x1234".into(), "short.eth".into());
        assert!(bad_suspect.validate().is_err());
    }

    #[test]
    fn test_unknown_sort_policy_fails_to_parse() {
        assert!(matches!(
            ViewerConfig::from_toml_str(r#"sort_policy = "random""#),
            Err(ConfigError::Parse(_))
        ));
    }
}
