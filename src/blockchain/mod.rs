//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! User input (address, amount)
//!     → units.rs (parse, checksum, unit conversion)
//! Password / secret prompt
//!     → keystore.rs (encrypted wallet files) → wallet.rs (Account, signing)
//! NetworkConfig
//!     → rpc.rs (EthRpc backends) → client.rs (timeouts, failover)
//!     → transfer.rs (balance check, plan, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Secrets only from non-echoing prompts or encrypted keystore files
//! - Never log private keys or passwords
//! - All RPC calls have configurable timeouts
//! - Nothing is broadcast unless every earlier step succeeded

pub mod client;
pub mod keystore;
pub mod nonce;
pub mod rpc;
pub mod transfer;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::ChainClient;
pub use keystore::{KeyVault, KeystoreError, WriteMode};
pub use nonce::AccountLocks;
pub use rpc::{AlloyRpc, EthRpc, ReceiptSummary, RpcFault};
pub use transfer::{
    GasOverrides, SignedTransfer, SubmittedTransfer, TransferAttempt, TransferPlan, TransferQuote,
    TransferRequest, TransferState,
};
pub use types::{
    Balance, BlockchainError, BlockchainResult, ChainId, EstimateSource, ExecutionStatus,
    GasEstimate, TransactionStatus, TransferResult, TransferWarning, BASE_TRANSFER_GAS,
};
pub use units::{format_amount, parse_address, parse_amount};
pub use wallet::Account;
