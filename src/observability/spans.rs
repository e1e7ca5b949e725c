//! Spans shared by the transfer flow.

use alloy::primitives::{Address, TxHash};
use tracing::Span;
use uuid::Uuid;

/// Span for one submit attempt. Every state transition is logged inside it.
pub fn transfer_span(attempt_id: Uuid, network: &str, from: Address, to: Address) -> Span {
    tracing::info_span!(
        "transfer",
        %attempt_id,
        network,
        from = %from,
        to = %to
    )
}

/// Span for receipt polling, which may outlive the attempt that submitted.
pub fn receipt_span(tx_hash: TxHash) -> Span {
    tracing::info_span!("wait_for_receipt", tx_hash = %tx_hash)
}
