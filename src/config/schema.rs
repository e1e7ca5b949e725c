//! Configuration schema definitions.
//!
//! `AppConfig` is read from TOML; `NetworkConfig` entries live in the JSON
//! network table managed by [`crate::config::networks::NetworkConfigStore`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the tool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Keystore location.
    pub wallet: WalletConfig,

    /// Network table location and default selection.
    pub networks: NetworksConfig,

    /// RPC timeouts and transfer limits.
    pub rpc: RpcConfig,

    /// Log level and format.
    pub logging: LoggingConfig,
}

/// Keystore settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Directory holding encrypted wallet files.
    pub dir: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("wallets"),
        }
    }
}

/// Network table settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworksConfig {
    /// JSON file with custom networks.
    pub file: PathBuf,

    /// Network used when `--network` is omitted.
    pub default: String,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("config/networks.json"),
            default: "ethereum_sepolia".to_string(),
        }
    }
}

/// RPC and transfer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// How long to wait for a receipt before reporting the outcome unknown.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            confirmation_timeout_secs: 180,
            poll_interval_ms: 2000,
            max_gas_price_gwei: 500,
        }
    }
}

impl RpcConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            rpc_timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_gas_price_gwei: self.max_gas_price_gwei,
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

/// Runtime knobs handed to a `ChainClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub rpc_timeout: Duration,
    pub poll_interval: Duration,
    pub max_gas_price_gwei: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        RpcConfig::default().client_settings()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// One chain the tool can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Table key, e.g. `ethereum_sepolia`. Not part of the JSON entry.
    #[serde(skip)]
    pub key: String,

    /// Human-readable name.
    pub name: String,

    /// Primary JSON-RPC endpoint.
    pub rpc_url: String,

    /// EIP-155 chain id.
    pub chain_id: u64,

    /// Native asset ticker.
    pub symbol: String,

    /// Block explorer base URL.
    pub explorer: String,

    /// Decimal places of the native asset.
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Extra endpoints tried in order when the primary fails a read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_rpc_urls: Vec<String>,
}

fn default_decimals() -> u8 {
    18
}

impl NetworkConfig {
    pub fn new(
        key: &str,
        name: &str,
        rpc_url: &str,
        chain_id: u64,
        symbol: &str,
        explorer: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            chain_id,
            symbol: symbol.to_string(),
            explorer: explorer.to_string(),
            decimals: default_decimals(),
            fallback_rpc_urls: Vec::new(),
        }
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{}", self.explorer.trim_end_matches('/'), tx_hash)
    }

    /// Primary endpoint followed by fallbacks.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.rpc_url.as_str()).chain(self.fallback_rpc_urls.iter().map(String::as_str))
    }
}
