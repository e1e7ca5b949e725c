//! Password-encrypted key storage.
//!
//! Files use the Web3 Secret Storage v3 layout (scrypt + AES-128-CTR +
//! keccak MAC) so they load in any Ethereum wallet that reads keystore JSON.

use std::fs;
use std::path::{Path, PathBuf};

use alloy::hex;
use eth_keystore::KeystoreError as EthKeystoreError;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::blockchain::wallet::Account;

/// Errors from key import, encryption and decryption.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// MAC check failed. Deliberately carries no detail.
    #[error("Incorrect password")]
    BadPassword,

    #[error("Corrupt keystore file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    #[error("Keystore file not found: {0}")]
    NotFound(PathBuf),

    #[error("Keystore file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type KeystoreResult<T> = Result<T, KeystoreError>;

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    CreateNew,
    Overwrite,
}

/// Generates, imports and persists accounts under a wallet directory.
#[derive(Debug, Clone)]
pub struct KeyVault {
    wallet_dir: PathBuf,
}

impl KeyVault {
    pub fn new(wallet_dir: impl Into<PathBuf>) -> Self {
        Self {
            wallet_dir: wallet_dir.into(),
        }
    }

    pub fn wallet_dir(&self) -> &Path {
        &self.wallet_dir
    }

    /// Create a new account with a random secret.
    pub fn generate(&self) -> Account {
        let account = Account::random();
        tracing::info!(address = %account.address(), "Generated new account");
        account
    }

    /// Import a hex-encoded secret (64 hex chars, optional `0x`).
    pub fn from_secret(&self, secret: &str) -> KeystoreResult<Account> {
        let trimmed = secret.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if key_hex.len() != 64 {
            return Err(KeystoreError::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                key_hex.len()
            )));
        }
        let bytes = Zeroizing::new(
            hex::decode(key_hex)
                .map_err(|_| KeystoreError::InvalidKey("not valid hex".to_string()))?,
        );
        Account::from_secret_bytes(&bytes).map_err(KeystoreError::InvalidKey)
    }

    /// Path used when `encrypt` is not given a destination.
    pub fn default_path(&self, account: &Account) -> PathBuf {
        self.wallet_dir
            .join(format!("{}.json", account.checksum_address()))
    }

    /// Encrypt `account` under `password` and write it to disk.
    ///
    /// Relative destinations resolve inside the wallet directory.
    pub fn encrypt(
        &self,
        account: &Account,
        password: &str,
        destination: Option<&Path>,
        mode: WriteMode,
    ) -> KeystoreResult<PathBuf> {
        let path = match destination {
            Some(dest) if dest.is_absolute() => dest.to_path_buf(),
            Some(dest) => self.wallet_dir.join(dest),
            None => self.default_path(account),
        };

        if path.exists() && mode == WriteMode::CreateNew {
            return Err(KeystoreError::AlreadyExists(path));
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                KeystoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid keystore file name: {}", path.display()),
                ))
            })?;
        fs::create_dir_all(&dir)?;

        let secret = account.secret_bytes();
        let mut rng = rand::thread_rng();
        eth_keystore::encrypt_key(&dir, &mut rng, secret.as_slice(), password, Some(name))
            .map_err(|e| match e {
                EthKeystoreError::StdIo(_) => KeystoreError::Io(std::io::Error::other(e.to_string())),
                other => KeystoreError::CorruptFile {
                    path: path.clone(),
                    reason: other.to_string(),
                },
            })?;

        tracing::info!(
            address = %account.address(),
            path = %path.display(),
            "Wallet encrypted and saved"
        );
        Ok(path)
    }

    /// Decrypt a keystore file.
    pub fn decrypt(&self, path: &Path, password: &str) -> KeystoreResult<Account> {
        if !path.exists() {
            return Err(KeystoreError::NotFound(path.to_path_buf()));
        }
        let corrupt = |reason: String| KeystoreError::CorruptFile {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read(path)?;
        serde_json::from_slice::<serde_json::Value>(&content)
            .map_err(|e| corrupt(format!("not valid JSON: {}", e)))?;

        let secret = eth_keystore::decrypt_key(path, password)
            .map(Zeroizing::new)
            .map_err(|e| match e {
                EthKeystoreError::MacMismatch => KeystoreError::BadPassword,
                other => corrupt(other.to_string()),
            })?;

        let account = Account::from_secret_bytes(&secret).map_err(corrupt)?;
        tracing::info!(address = %account.address(), "Wallet decrypted");
        Ok(account)
    }

    /// Keystore files in the wallet directory, sorted by name.
    pub fn list_wallets(&self) -> KeystoreResult<Vec<PathBuf>> {
        if !self.wallet_dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&self.wallet_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }
}
