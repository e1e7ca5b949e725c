//! Wallet and native-currency transfer toolkit for EVM chains.

pub mod blockchain;
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use blockchain::{Account, BlockchainError, ChainClient, KeyVault, TransferRequest};
pub use config::{AppConfig, NetworkConfig, NetworkConfigStore};
