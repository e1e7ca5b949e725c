//! Network table: built-in chains plus user-defined entries from JSON.
//!
//! A missing file means built-ins. A malformed file also means built-ins, but
//! the reason is kept and logged so the caller can tell the user.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::loader::ConfigError;
use crate::config::schema::NetworkConfig;
use crate::config::validation::{validate_network, ValidationError};

/// Chains available when no usable network file exists.
pub fn builtin_networks() -> Vec<NetworkConfig> {
    vec![
        NetworkConfig::new(
            "ethereum_mainnet",
            "Ethereum Mainnet",
            "https://eth.llamarpc.com",
            1,
            "ETH",
            "https://etherscan.io",
        ),
        NetworkConfig::new(
            "ethereum_sepolia",
            "Ethereum Sepolia Testnet",
            "https://rpc.sepolia.org",
            11_155_111,
            "ETH",
            "https://sepolia.etherscan.io",
        ),
        NetworkConfig::new(
            "polygon_mainnet",
            "Polygon Mainnet",
            "https://polygon-rpc.com",
            137,
            "MATIC",
            "https://polygonscan.com",
        ),
        NetworkConfig::new(
            "polygon_amoy",
            "Polygon Amoy Testnet",
            "https://rpc-amoy.polygon.technology",
            80_002,
            "MATIC",
            "https://amoy.polygonscan.com",
        ),
        NetworkConfig::new(
            "bsc_mainnet",
            "Binance Smart Chain Mainnet",
            "https://bsc-dataseed.binance.org",
            56,
            "BNB",
            "https://bscscan.com",
        ),
        NetworkConfig::new(
            "bsc_testnet",
            "Binance Smart Chain Testnet",
            "https://data-seed-prebsc-1-s1.binance.org:8545",
            97,
            "tBNB",
            "https://testnet.bscscan.com",
        ),
    ]
}

/// Ordered, keyed set of networks backed by an optional JSON file.
#[derive(Debug, Clone)]
pub struct NetworkConfigStore {
    path: Option<PathBuf>,
    networks: Vec<NetworkConfig>,
    fallback_reason: Option<String>,
}

impl NetworkConfigStore {
    /// Built-ins only, never persisted.
    pub fn builtin() -> Self {
        Self {
            path: None,
            networks: builtin_networks(),
            fallback_reason: None,
        }
    }

    /// Load from `path`, falling back to built-ins when it is absent or unusable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No network file, using built-in networks");
            return Self {
                path: Some(path),
                networks: builtin_networks(),
                fallback_reason: None,
            };
        }

        match read_networks(&path) {
            Ok(networks) => {
                tracing::info!(
                    path = %path.display(),
                    count = networks.len(),
                    "Loaded network configuration"
                );
                Self {
                    path: Some(path),
                    networks,
                    fallback_reason: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Network file is malformed, using built-in networks"
                );
                Self {
                    path: Some(path),
                    networks: builtin_networks(),
                    fallback_reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Why the file was ignored, if it was.
    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.key == key)
    }

    pub fn require(&self, key: &str) -> Result<&NetworkConfig, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::UnknownNetwork(key.to_string()))
    }

    /// Networks in insertion order.
    pub fn list(&self) -> &[NetworkConfig] {
        &self.networks
    }

    /// Insert or replace `key`, then persist the whole table.
    ///
    /// A malformed file that was ignored at load is kept as `<file>.bak`
    /// before the table is written over it.
    pub fn add(&mut self, key: &str, mut config: NetworkConfig) -> Result<(), ConfigError> {
        config.key = key.to_string();
        validate_network(&config).map_err(ConfigError::Validation)?;

        if let (Some(path), Some(reason)) = (&self.path, &self.fallback_reason) {
            if path.exists() {
                let backup = backup_path(path);
                fs::rename(path, &backup).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    reason = %reason,
                    "Replacing malformed network file, previous content kept as backup"
                );
            }
        }

        match self.networks.iter_mut().find(|n| n.key == key) {
            Some(existing) => *existing = config,
            None => self.networks.push(config),
        }
        self.save()?;
        if self.path.is_some() {
            self.fallback_reason = None;
        }

        tracing::info!(network = key, "Network saved");
        Ok(())
    }

    /// Write the table as pretty JSON. No-op for a store without a path.
    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };

        let mut table = Map::new();
        for network in &self.networks {
            table.insert(network.key.clone(), serde_json::to_value(network)?);
        }
        let json = serde_json::to_string_pretty(&Value::Object(table))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, json).map_err(io_err)?;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

fn read_networks(path: &Path) -> Result<Vec<NetworkConfig>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table: Map<String, Value> = serde_json::from_str(&content)?;

    let mut networks = Vec::with_capacity(table.len());
    let mut problems = Vec::new();
    for (key, value) in table {
        let mut network: NetworkConfig = serde_json::from_value(value)?;
        network.key = key;
        if let Err(errors) = validate_network(&network) {
            problems.extend(errors);
        }
        networks.push(network);
    }

    if !problems.is_empty() {
        return Err(ConfigError::Validation(problems));
    }
    if networks.is_empty() {
        return Err(ConfigError::Validation(vec![ValidationError::new(
            "networks",
            "file defines no networks",
        )]));
    }
    Ok(networks)
}
