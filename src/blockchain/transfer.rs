//! Native-currency transfer: plan, sign, broadcast, confirm.
//!
//! # Flow
//! ```text
//! Idle → Connected → BalanceChecked → PlanBuilt → Signed → Submitted → Confirmed
//!   any pre-broadcast step may end in Rejected
//!   Signed → Unknown when the broadcast outcome cannot be observed
//!   Submitted → Unknown when no receipt appears before the deadline
//! ```
//!
//! `submit` returns as soon as the node accepts the transaction so the hash
//! can be shown before waiting. `wait_for_receipt` can be called later with
//! only the hash.

use std::time::Duration;

use alloy::consensus::{SignableTransaction, Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use tokio::time::{interval, timeout};
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, EstimateSource, ExecutionStatus, GasEstimate,
    TransferResult, TransferWarning,
};
use crate::blockchain::units::{format_amount, parse_address, parse_amount};
use crate::blockchain::wallet::Account;
use crate::observability::spans;

/// Validated destination and amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    /// Amount in wei. Always positive.
    pub value: U256,
    /// The amount as the user typed it, for display.
    pub amount_text: String,
}

impl TransferRequest {
    /// Parse user input. Fails before any network call.
    pub fn parse(to: &str, amount: &str, decimals: u8) -> BlockchainResult<Self> {
        let to = parse_address(to)?;
        let value = parse_amount(amount, decimals)?;
        if value.is_zero() {
            return Err(BlockchainError::InvalidInput(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            to,
            value,
            amount_text: amount.trim().to_string(),
        })
    }
}

/// Caller-supplied gas values that replace the node's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasOverrides {
    /// Gas price in wei.
    pub gas_price: Option<u128>,
    pub gas_limit: Option<u64>,
}

/// Pre-broadcast cost summary for confirmation prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferQuote {
    pub value: U256,
    pub gas_price: u128,
    pub gas: GasEstimate,
    /// `gas_price * gas_limit`, in wei.
    pub max_fee: U256,
    pub decimals: u8,
}

impl TransferQuote {
    pub fn total(&self) -> U256 {
        self.value.saturating_add(self.max_fee)
    }

    pub fn display_fee(&self) -> String {
        format_amount(self.max_fee, self.decimals)
    }

    pub fn display_total(&self) -> String {
        format_amount(self.total(), self.decimals)
    }
}

/// Everything needed to sign, fixed at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
}

impl TransferPlan {
    fn unsigned(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: Bytes::new(),
        }
    }

    /// Sign with replay protection for `chain_id`.
    pub fn sign(&self, account: &Account) -> BlockchainResult<SignedTransfer> {
        let tx = self.unsigned();
        let signature = account.sign_hash(&tx.signature_hash())?;
        let signed: Signed<TxLegacy> = tx.into_signed(signature);
        let tx_hash = *signed.hash();
        let raw = TxEnvelope::Legacy(signed).encoded_2718();
        Ok(SignedTransfer {
            plan: self.clone(),
            tx_hash,
            raw,
        })
    }
}

/// Signed, encoded transaction ready to broadcast.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    pub plan: TransferPlan,
    pub tx_hash: TxHash,
    pub raw: Vec<u8>,
}

impl SignedTransfer {
    fn decode(&self) -> BlockchainResult<Signed<TxLegacy>> {
        match TxEnvelope::decode_2718(&mut self.raw.as_slice()) {
            Ok(TxEnvelope::Legacy(signed)) => Ok(signed),
            Ok(other) => Err(BlockchainError::Signing(format!(
                "unexpected transaction type {:?}",
                other.tx_type()
            ))),
            Err(e) => Err(BlockchainError::Signing(format!("undecodable transaction: {}", e))),
        }
    }

    /// Address that produced the signature.
    pub fn recover_signer(&self) -> BlockchainResult<Address> {
        let signed = self.decode()?;
        signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .map_err(|e| BlockchainError::Signing(e.to_string()))
    }

    /// Chain ID embedded in the signature payload.
    pub fn chain_id(&self) -> BlockchainResult<Option<u64>> {
        Ok(self.decode()?.tx().chain_id)
    }
}

impl std::fmt::Debug for SignedTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedTransfer")
            .field("tx_hash", &self.tx_hash)
            .field("nonce", &self.plan.nonce)
            .field("len", &self.raw.len())
            .finish()
    }
}

/// A transaction the node accepted.
#[derive(Debug, Clone)]
pub struct SubmittedTransfer {
    pub attempt_id: Uuid,
    pub tx_hash: TxHash,
    pub plan: TransferPlan,
    pub warnings: Vec<TransferWarning>,
}

/// Lifecycle of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Connected,
    BalanceChecked,
    PlanBuilt,
    Signed,
    Submitted,
    Confirmed,
    Rejected,
    Unknown,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected | Self::Unknown)
    }

    /// Whether `next` is a legal successor.
    pub fn can_advance_to(self, next: Self) -> bool {
        use TransferState::*;
        match (self, next) {
            (Idle, Connected)
            | (Connected, BalanceChecked)
            | (BalanceChecked, PlanBuilt)
            | (PlanBuilt, Signed)
            | (Signed, Submitted)
            | (Signed, Unknown)
            | (Submitted, Confirmed)
            | (Submitted, Unknown) => true,
            // Once broadcast, the outcome is never "rejected".
            (Submitted, Rejected) => false,
            (from, Rejected) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// State tracker for one attempt; logs each transition.
#[derive(Debug)]
pub struct TransferAttempt {
    id: Uuid,
    state: TransferState,
}

impl Default for TransferAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: TransferState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, "Transfer state changed");
        self.state = next;
    }

    /// Record a failure and hand the error back.
    pub fn fail(&mut self, err: BlockchainError) -> BlockchainError {
        let next = match err {
            BlockchainError::Unknown { .. } => TransferState::Unknown,
            _ => TransferState::Rejected,
        };
        tracing::warn!(state = ?self.state, error = %err, "Transfer attempt failed");
        self.advance(next);
        err
    }
}

impl ChainClient {
    /// Cost summary for a transfer without signing or locking anything.
    pub async fn quote(
        &self,
        from: Address,
        request: &TransferRequest,
        overrides: &GasOverrides,
    ) -> BlockchainResult<TransferQuote> {
        let gas_price = match overrides.gas_price {
            Some(price) => price,
            None => self.get_gas_price().await?,
        };
        self.check_gas_price(gas_price)?;

        let gas = match overrides.gas_limit {
            Some(gas_limit) => GasEstimate {
                gas_limit,
                source: EstimateSource::Override,
            },
            None => self.estimate_gas(from, request.to, request.value).await,
        };

        let max_fee = U256::from(gas_price).saturating_mul(U256::from(gas.gas_limit));
        Ok(TransferQuote {
            value: request.value,
            gas_price,
            gas,
            max_fee,
            decimals: self.network().decimals,
        })
    }

    /// Check funds, sign and broadcast. Returns once the node accepts it.
    ///
    /// Stops at the first failing step. Nothing is broadcast unless every
    /// step before it succeeded. The sender's nonce lock is held from the
    /// nonce read until the broadcast returns.
    pub async fn submit(
        &self,
        account: &Account,
        request: &TransferRequest,
        overrides: &GasOverrides,
    ) -> BlockchainResult<SubmittedTransfer> {
        let mut attempt = TransferAttempt::new();
        let from = account.address();
        let span = spans::transfer_span(attempt.id(), &self.network().key, from, request.to);

        async move {
            if !self.is_connected().await {
                return Err(attempt.fail(BlockchainError::Unreachable(format!(
                    "{} did not respond",
                    self.network().rpc_url
                ))));
            }
            attempt.advance(TransferState::Connected);

            let balance = match self.get_balance(from).await {
                Ok(balance) => balance,
                Err(e) => return Err(attempt.fail(e)),
            };
            if balance.wei < request.value {
                return Err(attempt.fail(BlockchainError::InsufficientFunds {
                    balance: balance.wei,
                    required: request.value,
                }));
            }
            attempt.advance(TransferState::BalanceChecked);

            let guard = self.locks().acquire(from).await;

            let (plan, warnings) = match self.build_plan(from, request, overrides).await {
                Ok(built) => built,
                Err(e) => return Err(attempt.fail(e)),
            };
            attempt.advance(TransferState::PlanBuilt);

            let signed = match plan.sign(account) {
                Ok(signed) => signed,
                Err(e) => return Err(attempt.fail(e)),
            };
            attempt.advance(TransferState::Signed);

            let tx_hash = match self.broadcast(&signed.raw, signed.tx_hash).await {
                Ok(hash) => hash,
                Err(e) => return Err(attempt.fail(e)),
            };
            drop(guard);
            attempt.advance(TransferState::Submitted);

            tracing::info!(
                tx_hash = %tx_hash,
                nonce = plan.nonce,
                gas_price = plan.gas_price,
                gas_limit = plan.gas_limit,
                "Transaction submitted"
            );

            Ok(SubmittedTransfer {
                attempt_id: attempt.id(),
                tx_hash,
                plan,
                warnings,
            })
        }
        .instrument(span)
        .await
    }

    async fn build_plan(
        &self,
        from: Address,
        request: &TransferRequest,
        overrides: &GasOverrides,
    ) -> BlockchainResult<(TransferPlan, Vec<TransferWarning>)> {
        let quote = self.quote(from, request, overrides).await?;

        let mut warnings = Vec::new();
        if let EstimateSource::Fallback { reason } = &quote.gas.source {
            warnings.push(TransferWarning::GasEstimateFallback {
                reason: reason.clone(),
            });
        }

        let nonce = self.get_nonce(from).await?;
        let chain_id = self.verify_chain_id().await?;

        let plan = TransferPlan {
            to: request.to,
            value: request.value,
            nonce,
            gas_price: quote.gas_price,
            gas_limit: quote.gas.gas_limit,
            chain_id,
        };
        tracing::debug!(?plan, "Transfer plan built");
        Ok((plan, warnings))
    }

    /// Poll for a receipt until it is mined or `deadline` passes.
    ///
    /// Receipt query failures are logged and polling continues. Past the
    /// deadline the result is `Unknown` with the hash, never a rejection.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        deadline: Duration,
    ) -> BlockchainResult<TransferResult> {
        let poll_interval = self.settings().poll_interval;
        let mut last_error: Option<String> = None;

        let polled = timeout(deadline, async {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;

                match self.get_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        if let Some(block_number) = receipt.block_number {
                            return TransferResult {
                                tx_hash,
                                status: if receipt.success {
                                    ExecutionStatus::Success
                                } else {
                                    ExecutionStatus::Failed
                                },
                                block_number,
                                gas_used: receipt.gas_used,
                                fee_paid: U256::from(receipt.gas_used)
                                    .saturating_mul(U256::from(receipt.effective_gas_price)),
                            };
                        }
                        tracing::debug!("Receipt has no block yet");
                    }
                    Ok(None) => tracing::debug!("Transaction pending"),
                    Err(e) => {
                        tracing::warn!(error = %e, "Receipt query failed, still polling");
                        last_error = Some(e.to_string());
                    }
                }
            }
        })
        .instrument(spans::receipt_span(tx_hash))
        .await;

        match polled {
            Ok(result) => {
                match result.status {
                    ExecutionStatus::Success => tracing::info!(
                        tx_hash = %tx_hash,
                        block = result.block_number,
                        gas_used = result.gas_used,
                        "Transaction confirmed"
                    ),
                    ExecutionStatus::Failed => tracing::warn!(
                        tx_hash = %tx_hash,
                        block = result.block_number,
                        "Transaction mined but execution failed"
                    ),
                }
                Ok(result)
            }
            Err(_) => {
                let reason = match last_error {
                    Some(e) => format!("no receipt after {:?} (last error: {})", deadline, e),
                    None => format!("no receipt after {:?}", deadline),
                };
                tracing::warn!(tx_hash = %tx_hash, %reason, "Transaction outcome unknown");
                Err(BlockchainError::Unknown { tx_hash, reason })
            }
        }
    }

    /// `submit` followed by `wait_for_receipt`.
    pub async fn transfer(
        &self,
        account: &Account,
        request: &TransferRequest,
        overrides: &GasOverrides,
        deadline: Duration,
    ) -> BlockchainResult<(SubmittedTransfer, TransferResult)> {
        let submitted = self.submit(account, request, overrides).await?;
        let result = self.wait_for_receipt(submitted.tx_hash, deadline).await?;
        Ok((submitted, result))
    }
}
