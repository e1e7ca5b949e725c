//! JSON-RPC backend abstraction.
//!
//! `ChainClient` talks to endpoints only through [`EthRpc`]. The production
//! implementation wraps an alloy HTTP provider; tests substitute scripted
//! backends.

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use async_trait::async_trait;
use thiserror::Error;

/// A failed RPC round trip.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RpcFault {
    message: String,
    rejected: bool,
}

impl RpcFault {
    /// Transport-level failure: the request may or may not have reached the node.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            rejected: false,
        }
    }

    /// The node answered with a JSON-RPC error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            rejected: true,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.rejected
    }
}

/// The subset of a receipt the transfer flow needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub effective_gas_price: u128,
}

/// Minimal Ethereum JSON-RPC surface.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// Label used in logs.
    fn endpoint(&self) -> &str;

    async fn block_number(&self) -> Result<u64, RpcFault>;
    async fn chain_id(&self) -> Result<u64, RpcFault>;
    async fn balance(&self, address: Address) -> Result<U256, RpcFault>;
    async fn gas_price(&self) -> Result<u128, RpcFault>;
    async fn estimate_gas(&self, from: Address, to: Address, value: U256) -> Result<u64, RpcFault>;
    /// Transaction count including pending transactions.
    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcFault>;
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcFault>;
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, RpcFault>;
}

/// [`EthRpc`] over an alloy HTTP provider.
pub struct AlloyRpc {
    url: String,
    provider: Arc<dyn Provider + Send + Sync>,
}

impl AlloyRpc {
    /// Build a provider for `url`. No request is made.
    pub fn http(url: &str) -> Result<Self, RpcFault> {
        let parsed: url::Url = url
            .parse()
            .map_err(|e| RpcFault::new(format!("invalid RPC URL '{}': {}", url, e)))?;
        let provider = ProviderBuilder::new().connect_http(parsed);
        Ok(Self {
            url: url.to_string(),
            provider: Arc::new(provider),
        })
    }
}

fn fault(e: TransportError) -> RpcFault {
    match e.as_error_resp() {
        Some(payload) => RpcFault::rejected(payload.to_string()),
        None => RpcFault::new(e.to_string()),
    }
}

#[async_trait]
impl EthRpc for AlloyRpc {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn block_number(&self) -> Result<u64, RpcFault> {
        self.provider.get_block_number().await.map_err(fault)
    }

    async fn chain_id(&self) -> Result<u64, RpcFault> {
        self.provider.get_chain_id().await.map_err(fault)
    }

    async fn balance(&self, address: Address) -> Result<U256, RpcFault> {
        self.provider.get_balance(address).await.map_err(fault)
    }

    async fn gas_price(&self) -> Result<u128, RpcFault> {
        self.provider.get_gas_price().await.map_err(fault)
    }

    async fn estimate_gas(&self, from: Address, to: Address, value: U256) -> Result<u64, RpcFault> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value);
        self.provider.estimate_gas(tx).await.map_err(fault)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcFault> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(fault)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcFault> {
        let pending = self.provider.send_raw_transaction(raw).await.map_err(fault)?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, RpcFault> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(fault)?;
        Ok(receipt.map(|r| ReceiptSummary {
            success: r.status(),
            block_number: r.block_number,
            gas_used: r.gas_used,
            effective_gas_price: r.effective_gas_price,
        }))
    }
}

impl std::fmt::Debug for AlloyRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyRpc").field("url", &self.url).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kinds() {
        assert!(!RpcFault::new("connection reset").is_rejection());
        let rejected = RpcFault::rejected("nonce too low");
        assert!(rejected.is_rejection());
        assert_eq!(rejected.to_string(), "nonce too low");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = AlloyRpc::http("not a url").unwrap_err();
        assert!(err.to_string().contains("invalid RPC URL"));
    }

    #[test]
    fn test_http_builds_without_network() {
        let rpc = AlloyRpc::http("http://127.0.0.1:8545").unwrap();
        assert_eq!(rpc.endpoint(), "http://127.0.0.1:8545");
    }
}
