//! Wallet Ledger CLI
//!
//! Command-line interface for provisioning wallets and moving tokens between
//! them.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --genesis-balance 1000000 transfer 0x0000000000000000000000000000000000000000 0x71C7656EC7ab88b098defB751B7401B5f6d8976F 500
//! cargo run -- --backend postgres --database-url postgresql://localhost/wallets migrate
//! cargo run -- --backend postgres import wallets.csv
//! cargo run -- --backend postgres export > wallets.csv
//! cargo run -- simulate --wallets 32 --transfers 100000 --workers 8
//! ```
//!
//! Command results go to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid address or amount, missing wallet, insufficient balance,
//!   store failure, unreadable file, etc.)

use std::process;
use wallet_ledger::{cli, logging};

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();

    logging::init_logging(&args.log_level, args.log_json);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    let mut output = std::io::stdout();
    if let Err(e) = runtime.block_on(cli::execute(&args, &mut output)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
