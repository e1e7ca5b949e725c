//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, TxHash, U256};
use async_trait::async_trait;

use crypto_transfer::blockchain::{Account, ChainClient, EthRpc, ReceiptSummary, RpcFault};
use crypto_transfer::config::{ClientSettings, NetworkConfig};

/// First Anvil dev account.
pub const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const SEPOLIA: u64 = 11_155_111;
pub const ONE_ETH: u128 = 1_000_000_000_000_000_000;
pub const GWEI: u128 = 1_000_000_000;
pub const MINED_BLOCK: u64 = 100;

pub fn eth(whole: u128) -> U256 {
    U256::from(whole * ONE_ETH)
}

pub fn funded_account() -> Account {
    let bytes = alloy::hex::decode(ANVIL_KEY).unwrap();
    Account::from_secret_bytes(&bytes).unwrap()
}

pub fn recipient() -> Address {
    Address::repeat_byte(0x42)
}

pub fn network() -> NetworkConfig {
    NetworkConfig::new(
        "ethereum_sepolia",
        "Ethereum Sepolia Testnet",
        "http://mock.invalid",
        SEPOLIA,
        "ETH",
        "https://sepolia.etherscan.io",
    )
}

pub fn fast_settings() -> ClientSettings {
    ClientSettings {
        rpc_timeout: Duration::from_secs(1),
        poll_interval: Duration::from_millis(10),
        max_gas_price_gwei: 500,
    }
}

pub fn client_with(backends: Vec<Arc<MockRpc>>) -> ChainClient {
    let backends = backends
        .into_iter()
        .map(|b| b as Arc<dyn EthRpc>)
        .collect();
    ChainClient::with_backends(network(), fast_settings(), backends)
}

/// What the node does with `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub enum SendBehavior {
    Accept,
    /// JSON-RPC error: the node looked at it and said no.
    Reject(String),
    /// The request went out but no answer came back.
    LoseResponse,
}

#[derive(Debug, Clone, Copy)]
enum ReceiptMode {
    Never,
    AfterPolls { polls: u32, success: bool },
}

#[derive(Debug)]
struct MockState {
    reachable: bool,
    chain_id: u64,
    balance: U256,
    gas_price: u128,
    estimate: Result<u64, String>,
    base_nonce: u64,
    send: SendBehavior,
    receipt: ReceiptMode,
    receipt_errors: u32,
    receipt_polls: u32,
    sent: Vec<Vec<u8>>,
    calls: Vec<&'static str>,
}

/// Scripted in-memory node. Records every call.
///
/// The pending nonce is `base_nonce + accepted sends`, like a mempool would
/// report. Nonce reads and sends yield briefly so unsynchronized callers
/// interleave.
#[derive(Debug)]
pub struct MockRpc {
    name: String,
    state: Mutex<MockState>,
}

impl MockRpc {
    pub fn new(chain_id: u64) -> Self {
        Self {
            name: "mock".to_string(),
            state: Mutex::new(MockState {
                reachable: true,
                chain_id,
                balance: U256::ZERO,
                gas_price: 2 * GWEI,
                estimate: Ok(21_000),
                base_nonce: 0,
                send: SendBehavior::Accept,
                receipt: ReceiptMode::AfterPolls {
                    polls: 1,
                    success: true,
                },
                receipt_errors: 0,
                receipt_polls: 0,
                sent: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// A Sepolia node holding `balance` for every address.
    pub fn sepolia(balance: U256) -> Self {
        Self::new(SEPOLIA).with_balance(balance)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn edit(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.edit(|s| s.balance = balance)
    }

    pub fn with_gas_price(self, gas_price: u128) -> Self {
        self.edit(|s| s.gas_price = gas_price)
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.edit(|s| s.base_nonce = nonce)
    }

    pub fn failing_estimate(self, reason: &str) -> Self {
        let reason = reason.to_string();
        self.edit(|s| s.estimate = Err(reason))
    }

    pub fn with_send(self, behavior: SendBehavior) -> Self {
        self.edit(|s| s.send = behavior)
    }

    pub fn mined_after(self, polls: u32, success: bool) -> Self {
        self.edit(|s| s.receipt = ReceiptMode::AfterPolls { polls, success })
    }

    pub fn never_mined(self) -> Self {
        self.edit(|s| s.receipt = ReceiptMode::Never)
    }

    pub fn with_receipt_errors(self, count: u32) -> Self {
        self.edit(|s| s.receipt_errors = count)
    }

    pub fn unreachable(self) -> Self {
        self.edit(|s| s.reachable = false)
    }

    /// Make a pending transaction appear in a block on the next query.
    pub fn mine_now(&self, success: bool) {
        let mut s = self.state.lock().unwrap();
        s.receipt = ReceiptMode::AfterPolls { polls: 0, success };
        s.receipt_polls = 0;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| **c == method).count()
    }

    /// Raw transactions that reached the node, accepted or not.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    fn enter(&self, method: &'static str) -> Result<std::sync::MutexGuard<'_, MockState>, RpcFault> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(method);
        if !s.reachable {
            return Err(RpcFault::new(format!("{}: connection refused", self.name)));
        }
        Ok(s)
    }
}

#[async_trait]
impl EthRpc for MockRpc {
    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn block_number(&self) -> Result<u64, RpcFault> {
        self.enter("block_number")?;
        Ok(MINED_BLOCK)
    }

    async fn chain_id(&self) -> Result<u64, RpcFault> {
        Ok(self.enter("chain_id")?.chain_id)
    }

    async fn balance(&self, _address: Address) -> Result<U256, RpcFault> {
        Ok(self.enter("balance")?.balance)
    }

    async fn gas_price(&self) -> Result<u128, RpcFault> {
        Ok(self.enter("gas_price")?.gas_price)
    }

    async fn estimate_gas(&self, _from: Address, _to: Address, _value: U256) -> Result<u64, RpcFault> {
        self.enter("estimate_gas")?
            .estimate
            .clone()
            .map_err(RpcFault::rejected)
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64, RpcFault> {
        let nonce = {
            let s = self.enter("pending_nonce")?;
            s.base_nonce + s.sent.len() as u64
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(nonce)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcFault> {
        let behavior = self.enter("send_raw_transaction")?.send.clone();
        tokio::time::sleep(Duration::from_millis(5)).await;
        match behavior {
            SendBehavior::Accept => {
                self.state.lock().unwrap().sent.push(raw.to_vec());
                Ok(keccak256(raw))
            }
            SendBehavior::Reject(reason) => Err(RpcFault::rejected(reason)),
            SendBehavior::LoseResponse => {
                self.state.lock().unwrap().sent.push(raw.to_vec());
                Err(RpcFault::new("connection reset by peer"))
            }
        }
    }

    async fn transaction_receipt(&self, _hash: TxHash) -> Result<Option<ReceiptSummary>, RpcFault> {
        let mut s = self.enter("transaction_receipt")?;
        if s.receipt_errors > 0 {
            s.receipt_errors -= 1;
            return Err(RpcFault::new("upstream timeout"));
        }
        s.receipt_polls += 1;
        match s.receipt {
            ReceiptMode::Never => Ok(None),
            ReceiptMode::AfterPolls { polls, .. } if s.receipt_polls <= polls => Ok(None),
            ReceiptMode::AfterPolls { success, .. } => Ok(Some(ReceiptSummary {
                success,
                block_number: Some(MINED_BLOCK),
                gas_used: 21_000,
                effective_gas_price: s.gas_price,
            })),
        }
    }
}
