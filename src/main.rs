//! crypto-transfer
//!
//! Creates and imports encrypted wallets, checks balances, and sends native
//! currency on Ethereum-compatible chains.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli::args ──▶ cli::commands ──▶ blockchain::transfer ──▶ blockchain::client ──▶ JSON-RPC
//!                              │                      │
//!                              ▼                      ▼
//!                        cli::prompt          blockchain::keystore
//!                     (no-echo secrets)      (encrypted wallet files)
//!
//!   config (TOML + networks JSON) and observability (tracing) are passed in,
//!   never global.
//! ```

use std::process::ExitCode;

use clap::Parser;

use crypto_transfer::cli::{self, AppContext, Cli};
use crypto_transfer::config::load_or_default;
use crypto_transfer::observability::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);
    tracing::debug!(
        wallet_dir = %config.wallet.dir.display(),
        networks_file = %config.networks.file.display(),
        default_network = %config.networks.default,
        "Configuration loaded"
    );

    let ctx = AppContext::new(config);
    match cli::run(cli, ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
