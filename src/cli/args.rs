//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "crypto-transfer")]
#[command(version, about = "Create wallets, check balances and send native-currency transfers", long_about = None)]
pub struct Cli {
    /// Application config file (TOML). Defaults to ./crypto-transfer.toml if present.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new wallet and save it encrypted
    CreateWallet(CreateWalletArgs),
    /// Decrypt a wallet file and show its address
    ImportWallet {
        /// Path to an encrypted wallet file
        file: PathBuf,
    },
    /// Check the balance of an address
    Balance {
        address: String,
        /// Network key (see list-networks)
        #[arg(long)]
        network: Option<String>,
    },
    /// Send native currency to an address
    Transfer(TransferArgs),
    /// Look up a transaction by hash
    Status {
        tx_hash: String,
        #[arg(long)]
        network: Option<String>,
    },
    /// List available networks
    ListNetworks,
    /// Add or replace a network in the network file
    AddNetwork(AddNetworkArgs),
}

#[derive(Debug, Args)]
pub struct CreateWalletArgs {
    /// Output file. Relative paths are placed in the wallet directory.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub force: bool,

    /// Encrypt an existing private key (prompted without echo) instead of generating one
    #[arg(long)]
    pub import_key: bool,

    /// Print the private key once after creation
    #[arg(long)]
    pub show_secret: bool,
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    /// Recipient address
    pub to: String,

    /// Amount in the network's native unit, e.g. 0.05
    pub amount: String,

    #[arg(long)]
    pub network: Option<String>,

    /// Encrypted wallet to send from. Without it the private key is prompted for.
    #[arg(long, value_name = "FILE")]
    pub wallet: Option<PathBuf>,

    /// Gas price override in gwei
    #[arg(long, value_name = "GWEI")]
    pub gas_price_gwei: Option<String>,

    /// Gas limit override
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Seconds to wait for a receipt (default from config)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct AddNetworkArgs {
    /// Key used with --network
    pub key: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub rpc_url: String,

    #[arg(long)]
    pub chain_id: u64,

    #[arg(long)]
    pub symbol: String,

    #[arg(long)]
    pub explorer: String,

    #[arg(long, default_value_t = 18)]
    pub decimals: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transfer_args() {
        let cli = Cli::try_parse_from([
            "crypto-transfer",
            "transfer",
            "0x0000000000000000000000000000000000000001",
            "0.5",
            "--network",
            "polygon_amoy",
            "--gas-limit",
            "30000",
            "-y",
        ])
        .unwrap();
        let Command::Transfer(args) = cli.command else {
            panic!("expected transfer");
        };
        assert_eq!(args.amount, "0.5");
        assert_eq!(args.network.as_deref(), Some("polygon_amoy"));
        assert_eq!(args.gas_limit, Some(30_000));
        assert!(args.yes);
        assert!(args.wallet.is_none());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["crypto-transfer", "list-networks", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Command::ListNetworks));
    }

    #[test]
    fn test_add_network_defaults_decimals() {
        let cli = Cli::try_parse_from([
            "crypto-transfer",
            "add-network",
            "local",
            "--name",
            "Local",
            "--rpc-url",
            "http://localhost:8545",
            "--chain-id",
            "31337",
            "--symbol",
            "ETH",
            "--explorer",
            "http://localhost",
        ])
        .unwrap();
        let Command::AddNetwork(args) = cli.command else {
            panic!("expected add-network");
        };
        assert_eq!(args.decimals, 18);
        assert_eq!(args.chain_id, 31337);
    }

    #[test]
    fn test_no_secret_arguments() {
        // Private keys and passwords are never accepted as arguments.
        assert!(Cli::try_parse_from(["crypto-transfer", "create-wallet", "--password", "x"]).is_err());
        assert!(Cli::try_parse_from(["crypto-transfer", "create-wallet", "--private-key", "x"]).is_err());
    }
}
