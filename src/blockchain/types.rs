//! Transfer types and error definitions.

use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::units::format_amount;

/// Gas cost of a plain value transfer with no calldata.
pub const BASE_TRANSFER_GAS: u64 = 21_000;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur while talking to a chain or running a transfer.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Liveness probe failed; nothing was attempted.
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    /// Malformed address, amount or URL. Detected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Sender balance is below the transfer amount (gas not counted).
    #[error("Insufficient funds: balance {balance} wei, required {required} wei")]
    InsufficientFunds { balance: U256, required: U256 },

    /// A read RPC call failed on every endpoint.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The endpoint reports a different chain than the configured network.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u128, max_gwei: u64 },

    /// Local signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The node rejected the broadcast. No transaction hash exists.
    #[error("Submission rejected: {0}")]
    SubmissionFailure(String),

    /// Broadcast succeeded but the outcome was not observed in time.
    #[error("Transaction {tx_hash} outcome unknown: {reason}")]
    Unknown { tx_hash: TxHash, reason: String },
}

impl BlockchainError {
    /// Whether a caller may safely repeat the whole attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Rpc(_))
    }

    /// Hash of the broadcast transaction, when the failure happened after submission.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Unknown { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// A balance in the smallest on-chain unit together with its display scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub wei: U256,
    pub decimals: u8,
}

impl Balance {
    pub fn new(wei: U256, decimals: u8) -> Self {
        Self { wei, decimals }
    }

    /// Lossy value for display rounding only.
    pub fn approx(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_amount(self.wei, self.decimals))
    }
}

/// Where a gas limit came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EstimateSource {
    /// Returned by `eth_estimateGas`.
    Node,
    /// Supplied by the caller.
    Override,
    /// Estimation failed; the plain-transfer baseline was used instead.
    Fallback { reason: String },
}

/// Gas limit plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_limit: u64,
    pub source: EstimateSource,
}

impl GasEstimate {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, EstimateSource::Fallback { .. })
    }
}

/// Non-fatal conditions observed during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferWarning {
    GasEstimateFallback { reason: String },
}

impl std::fmt::Display for TransferWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GasEstimateFallback { reason } => write!(
                f,
                "gas estimation failed ({}), using {} gas",
                reason, BASE_TRANSFER_GAS
            ),
        }
    }
}

/// Execution outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome of a mined transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub tx_hash: TxHash,
    pub status: ExecutionStatus,
    pub block_number: u64,
    pub gas_used: u64,
    /// `gas_used * effective_gas_price`, in wei.
    pub fee_paid: U256,
}

/// Point-in-time view of a transaction, as answered by a single receipt query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Not mined yet, or the receipt could not be fetched.
    Pending { error: Option<String> },
    Success { block_number: u64, gas_used: u64 },
    Failed { block_number: u64, gas_used: u64 },
}

impl TransactionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));

        let err = BlockchainError::InsufficientFunds {
            balance: U256::from(5),
            required: U256::from(10),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 5 wei, required 10 wei"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BlockchainError::Rpc("boom".into()).is_retryable());
        assert!(BlockchainError::Unreachable("down".into()).is_retryable());
        assert!(!BlockchainError::SubmissionFailure("nonce too low".into()).is_retryable());

        let unknown = BlockchainError::Unknown {
            tx_hash: TxHash::repeat_byte(0xab),
            reason: "timeout".into(),
        };
        assert!(!unknown.is_retryable());
        assert_eq!(unknown.tx_hash(), Some(TxHash::repeat_byte(0xab)));
    }

    #[test]
    fn test_balance_display_is_exact() {
        let wei = U256::from(1_500_000_000_000_000_001u128);
        let balance = Balance::new(wei, 18);
        assert_eq!(balance.to_string(), "1.500000000000000001");
        assert!((balance.approx() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_warning_mentions_baseline() {
        let warning = TransferWarning::GasEstimateFallback {
            reason: "execution reverted".into(),
        };
        assert!(warning.to_string().contains("21000"));
    }
}
