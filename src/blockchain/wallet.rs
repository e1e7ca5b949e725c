//! Accounts and transaction signing.
//!
//! # Security
//! - The secret lives inside the alloy signer and is zeroized on drop
//! - `Debug` prints the address only
//! - Secret bytes are exported only into `Zeroizing` buffers

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use zeroize::Zeroizing;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// A key pair able to sign transfers.
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
}

impl Account {
    /// Wrap an existing signer.
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Generate a fresh key from the OS-seeded CSPRNG.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Build from raw secret bytes. Fails for a zero or out-of-range scalar.
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, String> {
        if secret.len() != 32 {
            return Err(format!("expected 32 secret bytes, got {}", secret.len()));
        }
        PrivateKeySigner::from_slice(secret)
            .map(Self::from_signer)
            .map_err(|e| e.to_string())
    }

    /// The account address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-55 rendering of the address.
    pub fn checksum_address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    /// Copy of the 32-byte secret, wiped when dropped.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(self.signer.credential().to_bytes().as_slice());
        out
    }

    /// Sign a 32-byte prehash. Local and side-effect free.
    pub fn sign_hash(&self, hash: &B256) -> BlockchainResult<Signature> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|e| BlockchainError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
