//! Chain client with per-call timeouts and endpoint failover.
//!
//! # Responsibilities
//! - Probe liveness of the configured network
//! - Query chain state (balance, gas price, nonce, chain ID, receipts)
//! - Fail over across endpoints for reads
//! - Broadcast signed transactions, primary first, same bytes on failover

use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use tokio::time::timeout;

use crate::blockchain::nonce::AccountLocks;
use crate::blockchain::rpc::{AlloyRpc, EthRpc, ReceiptSummary, RpcFault};
use crate::blockchain::types::{
    Balance, BlockchainError, BlockchainResult, ChainId, EstimateSource, GasEstimate,
    TransactionStatus, BASE_TRANSFER_GAS,
};
use crate::blockchain::units::parse_address;
use crate::config::{ClientSettings, NetworkConfig};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Client bound to one network. Clones share endpoints and account locks.
#[derive(Clone)]
pub struct ChainClient {
    /// Primary endpoint first, then fallbacks.
    backends: Vec<Arc<dyn EthRpc>>,
    network: NetworkConfig,
    settings: ClientSettings,
    locks: AccountLocks,
}

impl ChainClient {
    /// Build HTTP backends for `network` and probe the primary.
    ///
    /// Returns `Unreachable` when no endpoint answers the probe, and
    /// `InvalidInput` when the primary RPC URL cannot be parsed.
    pub async fn connect(network: NetworkConfig, settings: ClientSettings) -> BlockchainResult<Self> {
        let mut backends: Vec<Arc<dyn EthRpc>> = Vec::new();

        let primary = AlloyRpc::http(&network.rpc_url)
            .map_err(|e| BlockchainError::InvalidInput(e.to_string()))?;
        backends.push(Arc::new(primary));

        for url in &network.fallback_rpc_urls {
            match AlloyRpc::http(url) {
                Ok(rpc) => backends.push(Arc::new(rpc)),
                Err(e) => tracing::warn!(url = %url, error = %e, "Ignoring invalid fallback RPC URL"),
            }
        }

        let client = Self::with_backends(network, settings, backends);
        if !client.is_connected().await {
            return Err(BlockchainError::Unreachable(format!(
                "{} ({}) did not respond",
                client.network.name, client.network.rpc_url
            )));
        }

        tracing::info!(
            network = %client.network.key,
            rpc_url = %client.network.rpc_url,
            endpoints = client.backends.len(),
            "Connected to network"
        );
        Ok(client)
    }

    /// Client over caller-supplied backends. No probe is made.
    pub fn with_backends(
        network: NetworkConfig,
        settings: ClientSettings,
        backends: Vec<Arc<dyn EthRpc>>,
    ) -> Self {
        Self {
            backends,
            network,
            settings,
            locks: AccountLocks::new(),
        }
    }

    /// Share nonce serialization with other clients for the same accounts.
    pub fn with_account_locks(mut self, locks: AccountLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub(crate) fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    /// Run a read on each endpoint in turn until one answers.
    async fn read<T, F, Fut>(&self, method: &'static str, call: F) -> BlockchainResult<T>
    where
        F: Fn(Arc<dyn EthRpc>) -> Fut,
        Fut: Future<Output = Result<T, RpcFault>>,
    {
        let mut last_error = None;
        for (i, backend) in self.backends.iter().enumerate() {
            match timeout(self.settings.rpc_timeout, call(Arc::clone(backend))).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(
                        provider_idx = i,
                        endpoint = backend.endpoint(),
                        method,
                        error = %e,
                        "RPC error, trying next provider"
                    );
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(
                        provider_idx = i,
                        endpoint = backend.endpoint(),
                        method,
                        "RPC timeout, trying next provider"
                    );
                    last_error = Some(format!("timed out after {:?}", self.settings.rpc_timeout));
                }
            }
        }
        Err(BlockchainError::Rpc(format!(
            "{} failed on all providers: {}",
            method,
            last_error.unwrap_or_else(|| "no providers configured".to_string())
        )))
    }

    /// Liveness probe: true if any endpoint returns a block number.
    pub async fn is_connected(&self) -> bool {
        self.get_block_number().await.is_ok()
    }

    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.read("eth_blockNumber", |rpc| async move { rpc.block_number().await })
            .await
    }

    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.read("eth_chainId", |rpc| async move { rpc.chain_id().await })
            .await
            .map(ChainId)
    }

    /// Fetch the live chain ID and compare it with the configured one.
    pub async fn verify_chain_id(&self) -> BlockchainResult<u64> {
        let actual = self.get_chain_id().await?.0;
        if actual != self.network.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.network.chain_id,
                actual,
            });
        }
        Ok(actual)
    }

    pub async fn get_balance(&self, address: Address) -> BlockchainResult<Balance> {
        let wei = self
            .read("eth_getBalance", |rpc| async move { rpc.balance(address).await })
            .await?;
        Ok(Balance::new(wei, self.network.decimals))
    }

    /// Balance of an address given as text. Malformed input makes no call.
    pub async fn balance_of_str(&self, address: &str) -> BlockchainResult<Balance> {
        let address = parse_address(address)?;
        self.get_balance(address).await
    }

    /// Current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.read("eth_gasPrice", |rpc| async move { rpc.gas_price().await })
            .await
    }

    /// Reject a gas price above the configured ceiling.
    pub fn check_gas_price(&self, gas_price: u128) -> BlockchainResult<()> {
        let current_gwei = gas_price / WEI_PER_GWEI;
        let max_gwei = self.settings.max_gas_price_gwei;
        if current_gwei > u128::from(max_gwei) {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei,
                max_gwei,
            });
        }
        Ok(())
    }

    /// Estimate gas for a plain transfer.
    ///
    /// Never fails: when the node cannot estimate, the result carries the
    /// 21000 baseline and a `Fallback` source with the reason.
    pub async fn estimate_gas(&self, from: Address, to: Address, value: U256) -> GasEstimate {
        match self
            .read("eth_estimateGas", |rpc| async move {
                rpc.estimate_gas(from, to, value).await
            })
            .await
        {
            Ok(gas_limit) => GasEstimate {
                gas_limit,
                source: EstimateSource::Node,
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = BASE_TRANSFER_GAS,
                    "Gas estimation failed, using plain transfer gas"
                );
                GasEstimate {
                    gas_limit: BASE_TRANSFER_GAS,
                    source: EstimateSource::Fallback {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// Next nonce for `address`, counting transactions still in the mempool.
    pub async fn get_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.read("eth_getTransactionCount", |rpc| async move {
            rpc.pending_nonce(address).await
        })
        .await
    }

    pub(crate) async fn get_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>> {
        self.read("eth_getTransactionReceipt", |rpc| async move {
            rpc.transaction_receipt(tx_hash).await
        })
        .await
    }

    /// One receipt query. RPC failures are reported as `Pending` with the error.
    pub async fn get_transaction_status(&self, tx_hash: TxHash) -> TransactionStatus {
        match self.get_receipt(tx_hash).await {
            Ok(Some(ReceiptSummary {
                success,
                block_number: Some(block_number),
                gas_used,
                ..
            })) => {
                if success {
                    TransactionStatus::Success {
                        block_number,
                        gas_used,
                    }
                } else {
                    TransactionStatus::Failed {
                        block_number,
                        gas_used,
                    }
                }
            }
            Ok(_) => TransactionStatus::Pending { error: None },
            Err(e) => {
                tracing::debug!(tx_hash = %tx_hash, error = %e, "Receipt query failed");
                TransactionStatus::Pending {
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Send raw bytes, primary endpoint first.
    ///
    /// A JSON-RPC error from the node is a `SubmissionFailure`. A transport
    /// failure or timeout moves on to the next endpoint with the same signed
    /// bytes, which keep their nonce and hash. If every endpoint fails that
    /// way the result is `Unknown` with the locally computed hash, since any
    /// of them may have accepted the transaction.
    pub(crate) async fn broadcast(&self, raw: &[u8], local_hash: TxHash) -> BlockchainResult<TxHash> {
        if self.backends.is_empty() {
            return Err(BlockchainError::SubmissionFailure(
                "no RPC endpoint configured".to_string(),
            ));
        }

        let mut ambiguous: Option<String> = None;
        for (idx, backend) in self.backends.iter().enumerate() {
            let fault = match timeout(self.settings.rpc_timeout, backend.send_raw_transaction(raw)).await {
                Ok(Ok(tx_hash)) => {
                    if tx_hash != local_hash {
                        tracing::warn!(
                            node_hash = %tx_hash,
                            local_hash = %local_hash,
                            "Node reported a different transaction hash"
                        );
                    }
                    return Ok(tx_hash);
                }
                Ok(Err(e)) if e.is_rejection() => match ambiguous {
                    // An earlier endpoint may already hold the transaction.
                    Some(previous) => {
                        return Err(BlockchainError::Unknown {
                            tx_hash: local_hash,
                            reason: format!("{}; then rejected by {}: {}", previous, backend.endpoint(), e),
                        })
                    }
                    None => return Err(BlockchainError::SubmissionFailure(e.to_string())),
                },
                Ok(Err(e)) => format!("broadcast transport error on {}: {}", backend.endpoint(), e),
                Err(_) => format!(
                    "broadcast to {} timed out after {:?}",
                    backend.endpoint(),
                    self.settings.rpc_timeout
                ),
            };
            tracing::warn!(
                provider_idx = idx,
                tx_hash = %local_hash,
                error = %fault,
                "Broadcast failed, trying next provider"
            );
            ambiguous = Some(fault);
        }

        Err(BlockchainError::Unknown {
            tx_hash: local_hash,
            reason: ambiguous.unwrap_or_else(|| "broadcast failed".to_string()),
        })
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("network", &self.network.key)
            .field("chain_id", &self.network.chain_id)
            .field("endpoints", &self.backends.len())
            .field("timeout", &self.settings.rpc_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn local_network(rpc_url: &str) -> NetworkConfig {
        NetworkConfig::new("local", "Local", rpc_url, 31337, "ETH", "http://localhost")
    }

    fn fast_settings() -> ClientSettings {
        ClientSettings {
            rpc_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
            max_gas_price_gwei: 100,
        }
    }

    #[tokio::test]
    async fn test_invalid_primary_url() {
        let err = ChainClient::connect(local_network("not a url"), fast_settings())
            .await
            .unwrap_err();
        assert!(matches!(err, BlockchainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Port 1 is never an RPC server.
        let err = ChainClient::connect(local_network("http://127.0.0.1:1"), fast_settings())
            .await
            .unwrap_err();
        assert!(matches!(err, BlockchainError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_no_backends_reports_rpc_error() {
        let client = ChainClient::with_backends(local_network("http://127.0.0.1:1"), fast_settings(), Vec::new());
        assert!(!client.is_connected().await);
        let err = client.get_gas_price().await.unwrap_err();
        assert!(err.to_string().contains("no providers configured"));
    }

    #[test]
    fn test_gas_price_ceiling() {
        let client = ChainClient::with_backends(local_network("http://127.0.0.1:1"), fast_settings(), Vec::new());
        assert!(client.check_gas_price(100 * WEI_PER_GWEI).is_ok());
        let err = client.check_gas_price(101 * WEI_PER_GWEI).unwrap_err();
        assert!(matches!(
            err,
            BlockchainError::GasPriceTooHigh {
                current_gwei: 101,
                max_gwei: 100
            }
        ));
    }
}
