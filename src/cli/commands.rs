//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::TxHash;
use anyhow::{anyhow, bail, Context, Result};

use crate::blockchain::{
    format_amount, parse_address, parse_amount, Account, BlockchainError, ChainClient,
    ExecutionStatus, GasOverrides, KeyVault, TransactionStatus, TransferRequest, WriteMode,
};
use crate::cli::args::{AddNetworkArgs, Cli, Command, CreateWalletArgs, TransferArgs};
use crate::cli::prompt;
use crate::config::{AppConfig, NetworkConfig, NetworkConfigStore};
use crate::lifecycle::interrupted;

const GWEI_DECIMALS: u8 = 9;
const RULE: &str = "============================================================";

/// Everything a command needs, built once from config.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub networks: NetworkConfigStore,
    pub vault: KeyVault,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let networks = NetworkConfigStore::load(&config.networks.file);
        let vault = KeyVault::new(&config.wallet.dir);
        Self {
            config,
            networks,
            vault,
        }
    }

    /// Named network, or the configured default.
    pub fn network(&self, key: Option<&str>) -> Result<NetworkConfig> {
        let key = key.unwrap_or(&self.config.networks.default);
        Ok(self.networks.require(key)?.clone())
    }

    async fn connect(&self, network: NetworkConfig) -> Result<ChainClient> {
        println!("Connecting to {}...", network.name);
        let name = network.name.clone();
        let client = ChainClient::connect(network, self.config.rpc.client_settings()).await?;
        println!("Connected to {}", name);
        Ok(client)
    }

    /// A wallet path as given, or inside the wallet directory when it is a
    /// bare relative name that does not exist in the working directory.
    fn resolve_wallet(&self, path: &Path) -> PathBuf {
        if path.is_relative() && !path.exists() {
            let candidate = self.vault.wallet_dir().join(path);
            if candidate.exists() {
                return candidate;
            }
        }
        path.to_path_buf()
    }
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli, ctx: AppContext) -> Result<()> {
    if let Some(reason) = ctx.networks.fallback_reason() {
        eprintln!("Warning: network file ignored, using built-in networks ({})", reason);
    }

    match cli.command {
        Command::CreateWallet(args) => create_wallet(&ctx, args),
        Command::ImportWallet { file } => import_wallet(&ctx, &file),
        Command::Balance { address, network } => balance(&ctx, &address, network.as_deref()).await,
        Command::Transfer(args) => transfer(&ctx, args).await,
        Command::Status { tx_hash, network } => status(&ctx, &tx_hash, network.as_deref()).await,
        Command::ListNetworks => {
            list_networks(&ctx);
            Ok(())
        }
        Command::AddNetwork(args) => add_network(ctx, args),
    }
}

fn create_wallet(ctx: &AppContext, args: CreateWalletArgs) -> Result<()> {
    let account = if args.import_key {
        let secret = prompt::secret("Enter private key: ")?;
        ctx.vault.from_secret(&secret)?
    } else {
        println!("Creating new wallet...");
        ctx.vault.generate()
    };

    println!("\n{}", RULE);
    println!("Address: {}", account.checksum_address());
    if args.show_secret {
        let secret = account.secret_bytes();
        println!("Private Key: 0x{}", alloy::hex::encode(secret.as_slice()));
        println!("{}", RULE);
        println!("Save your private key securely and never share it.");
    } else {
        println!("{}", RULE);
    }

    let password = prompt::new_password()?;
    let mode = if args.force {
        WriteMode::Overwrite
    } else {
        WriteMode::CreateNew
    };
    let path = ctx
        .vault
        .encrypt(&account, &password, args.out.as_deref(), mode)?;
    println!("Wallet saved to: {}", path.display());
    Ok(())
}

fn import_wallet(ctx: &AppContext, file: &Path) -> Result<()> {
    let path = ctx.resolve_wallet(file);
    let password = prompt::secret("Enter wallet password: ")?;
    let account = ctx.vault.decrypt(&path, &password)?;

    println!("\n{}", RULE);
    println!("WALLET IMPORTED");
    println!("Address: {}", account.checksum_address());
    println!("File:    {}", path.display());
    println!("{}", RULE);
    Ok(())
}

async fn balance(ctx: &AppContext, address: &str, network: Option<&str>) -> Result<()> {
    let network = ctx.network(network)?;
    let address = parse_address(address)?;
    let symbol = network.symbol.clone();

    let client = ctx.connect(network).await?;
    let balance = client.get_balance(address).await?;

    println!("\n{}", RULE);
    println!("Address: {}", address.to_checksum(None));
    println!("Balance: {} {}", balance, symbol);
    println!("{}", RULE);
    Ok(())
}

fn gas_overrides(args: &TransferArgs) -> Result<GasOverrides> {
    let gas_price = match &args.gas_price_gwei {
        Some(gwei) => {
            let wei = parse_amount(gwei, GWEI_DECIMALS).context("Invalid --gas-price-gwei")?;
            Some(u128::try_from(wei).map_err(|_| anyhow!("--gas-price-gwei is too large"))?)
        }
        None => None,
    };
    if args.gas_limit == Some(0) {
        bail!("--gas-limit must be greater than 0");
    }
    Ok(GasOverrides {
        gas_price,
        gas_limit: args.gas_limit,
    })
}

fn load_sender(ctx: &AppContext, wallet: Option<&Path>) -> Result<Account> {
    match wallet {
        Some(file) => {
            let path = ctx.resolve_wallet(file);
            let password = prompt::secret("Enter wallet password: ")?;
            Ok(ctx.vault.decrypt(&path, &password)?)
        }
        None => {
            let saved = ctx.vault.list_wallets().unwrap_or_default();
            if !saved.is_empty() {
                println!("Saved wallets (use --wallet FILE):");
                for path in &saved {
                    println!("  {}", path.display());
                }
            }
            let secret = prompt::secret("Enter your private key: ")?;
            Ok(ctx.vault.from_secret(&secret)?)
        }
    }
}

async fn transfer(ctx: &AppContext, args: TransferArgs) -> Result<()> {
    let network = ctx.network(args.network.as_deref())?;
    let request = TransferRequest::parse(&args.to, &args.amount, network.decimals)?;
    let overrides = gas_overrides(&args)?;
    let deadline = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.rpc.confirmation_timeout());

    let account = load_sender(ctx, args.wallet.as_deref())?;
    let client = ctx.connect(network.clone()).await?;
    let symbol = &network.symbol;

    let balance = client.get_balance(account.address()).await?;
    println!("\nYour balance: {} {}", balance, symbol);
    if balance.wei < request.value {
        bail!(BlockchainError::InsufficientFunds {
            balance: balance.wei,
            required: request.value,
        });
    }

    let quote = client.quote(account.address(), &request, &overrides).await?;

    println!("\n{}", RULE);
    println!("TRANSFER DETAILS");
    println!("{}", RULE);
    println!("From:      {}", account.checksum_address());
    println!("To:        {}", request.to.to_checksum(None));
    println!("Amount:    {} {}", request.amount_text, symbol);
    println!(
        "Gas:       {} @ {} gwei",
        quote.gas.gas_limit,
        format_amount(alloy::primitives::U256::from(quote.gas_price), GWEI_DECIMALS)
    );
    println!("Max fee:   {} {} (estimate)", quote.display_fee(), symbol);
    println!("Total:     {} {} (estimate)", quote.display_total(), symbol);
    println!("{}", RULE);
    if quote.gas.is_fallback() {
        println!("Warning: gas estimation failed, using the plain transfer limit");
    }
    if balance.wei < quote.total() {
        println!("Warning: balance may not cover the amount plus fees");
    }

    if !args.yes && !prompt::confirm("\nConfirm transfer? (yes/no): ")? {
        println!("Transfer cancelled");
        return Ok(());
    }

    println!("\nSending transaction...");
    let submitted = match client.submit(&account, &request, &overrides).await {
        Ok(submitted) => submitted,
        Err(e) => {
            if let Some(tx_hash) = e.tx_hash() {
                print_follow_up(&network, tx_hash);
            }
            return Err(e.into());
        }
    };
    for warning in &submitted.warnings {
        println!("Warning: {}", warning);
    }
    println!("Transaction hash: {}", submitted.tx_hash);
    println!("Explorer: {}", network.tx_url(submitted.tx_hash));
    println!("Waiting up to {}s for confirmation (Ctrl-C stops waiting)...", deadline.as_secs());

    let outcome = tokio::select! {
        outcome = client.wait_for_receipt(submitted.tx_hash, deadline) => outcome,
        _ = interrupted() => {
            println!("\nStopped waiting. The transaction is still in flight.");
            print_follow_up(&network, submitted.tx_hash);
            return Ok(());
        }
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            print_follow_up(&network, submitted.tx_hash);
            return Err(e.into());
        }
    };

    println!("\n{}", RULE);
    match result.status {
        ExecutionStatus::Success => println!("TRANSFER SUCCESSFUL"),
        ExecutionStatus::Failed => println!("TRANSACTION MINED, EXECUTION FAILED"),
    }
    println!("{}", RULE);
    println!("Transaction Hash: {}", result.tx_hash);
    println!("Status:           {}", result.status);
    println!("Block Number:     {}", result.block_number);
    println!("Gas Used:         {}", result.gas_used);
    println!("Fee Paid:         {} {}", format_amount(result.fee_paid, network.decimals), symbol);
    println!("Explorer:         {}", network.tx_url(result.tx_hash));
    println!("{}", RULE);

    if result.status == ExecutionStatus::Failed {
        bail!("transaction {} was mined but execution failed", result.tx_hash);
    }
    Ok(())
}

fn print_follow_up(network: &NetworkConfig, tx_hash: TxHash) {
    println!("Transaction hash: {}", tx_hash);
    println!(
        "Check it later with: crypto-transfer status {} --network {}",
        tx_hash, network.key
    );
    println!("Do not resend until it is known to have failed.");
}

async fn status(ctx: &AppContext, tx_hash: &str, network: Option<&str>) -> Result<()> {
    let network = ctx.network(network)?;
    let tx_hash: TxHash = tx_hash
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid transaction hash '{}': {}", tx_hash, e))?;

    let client = ctx.connect(network.clone()).await?;
    match client.get_transaction_status(tx_hash).await {
        TransactionStatus::Pending { error: None } => {
            println!("{}: pending (no receipt yet)", tx_hash);
        }
        TransactionStatus::Pending { error: Some(e) } => {
            println!("{}: unknown, receipt query failed: {}", tx_hash, e);
        }
        TransactionStatus::Success {
            block_number,
            gas_used,
        } => {
            println!("{}: success in block {} (gas used {})", tx_hash, block_number, gas_used);
        }
        TransactionStatus::Failed {
            block_number,
            gas_used,
        } => {
            println!(
                "{}: mined in block {} but execution failed (gas used {})",
                tx_hash, block_number, gas_used
            );
        }
    }
    println!("Explorer: {}", network.tx_url(tx_hash));
    Ok(())
}

fn list_networks(ctx: &AppContext) {
    println!("\n{}", RULE);
    println!("AVAILABLE NETWORKS");
    println!("{}", RULE);
    for network in ctx.networks.list() {
        let marker = if network.key == ctx.config.networks.default {
            " (default)"
        } else {
            ""
        };
        println!("\n{}{}:", network.key, marker);
        println!("  Name:     {}", network.name);
        println!("  Chain ID: {}", network.chain_id);
        println!("  Symbol:   {}", network.symbol);
        println!("  RPC:      {}", network.rpc_url);
    }
    println!("{}", RULE);
}

fn add_network(mut ctx: AppContext, args: AddNetworkArgs) -> Result<()> {
    let mut network = NetworkConfig::new(
        &args.key,
        &args.name,
        &args.rpc_url,
        args.chain_id,
        &args.symbol,
        &args.explorer,
    );
    network.decimals = args.decimals;

    ctx.networks.add(&args.key, network)?;
    match ctx.networks.path() {
        Some(path) => println!("Network '{}' saved to {}", args.key, path.display()),
        None => println!("Network '{}' added", args.key),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::Cli;
    use clap::Parser;

    fn transfer_args(extra: &[&str]) -> TransferArgs {
        let mut argv = vec![
            "crypto-transfer",
            "transfer",
            "0x0000000000000000000000000000000000000001",
            "1",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Transfer(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_gas_overrides_fractional_gwei() {
        let overrides = gas_overrides(&transfer_args(&["--gas-price-gwei", "1.5"])).unwrap();
        assert_eq!(overrides.gas_price, Some(1_500_000_000));
        assert_eq!(overrides.gas_limit, None);
    }

    #[test]
    fn test_gas_overrides_reject_zero_limit() {
        assert!(gas_overrides(&transfer_args(&["--gas-limit", "0"])).is_err());
        assert!(gas_overrides(&transfer_args(&["--gas-price-gwei", "abc"])).is_err());
    }

    #[test]
    fn test_context_default_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.networks.file = dir.path().join("networks.json");
        config.wallet.dir = dir.path().join("wallets");

        let ctx = AppContext::new(config);
        assert_eq!(ctx.network(None).unwrap().key, "ethereum_sepolia");
        assert_eq!(ctx.network(Some("bsc_testnet")).unwrap().chain_id, 97);
        assert!(ctx.network(Some("nope")).is_err());
    }

    #[test]
    fn test_resolve_wallet_prefers_wallet_dir_for_bare_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.networks.file = dir.path().join("networks.json");
        config.wallet.dir = dir.path().to_path_buf();
        std::fs::write(dir.path().join("saved-wallet-test.json"), "{}").unwrap();

        let ctx = AppContext::new(config);
        assert_eq!(
            ctx.resolve_wallet(Path::new("saved-wallet-test.json")),
            dir.path().join("saved-wallet-test.json")
        );
        assert_eq!(
            ctx.resolve_wallet(Path::new("missing.json")),
            PathBuf::from("missing.json")
        );
    }
}
