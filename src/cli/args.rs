use crate::simulation::SimulationConfig;
use crate::store::StoreConfig;
use crate::types::{Amount, Balance};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Wallet ledger with deadlock-free concurrent transfers
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger")]
#[command(about = "Wallet ledger with deadlock-free concurrent transfers", long_about = None)]
pub struct CliArgs {
    /// Store backend holding the wallets
    #[arg(
        long = "backend",
        value_name = "BACKEND",
        default_value = "memory",
        global = true,
        help = "Store backend: 'memory' (process-local) or 'postgres'"
    )]
    pub backend: StoreBackend,

    /// PostgreSQL connection string (postgres backend only)
    #[arg(long = "database-url", value_name = "URL", env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Pool size (postgres backend only)
    #[arg(
        long = "max-connections",
        value_name = "COUNT",
        global = true,
        help = "Maximum number of pooled database connections (default: 10)"
    )]
    pub max_connections: Option<u32>,

    /// Row lock wait limit
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        global = true,
        help = "Maximum time a transfer waits for a wallet lock (default: 5000)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Seed the genesis wallet with this balance if it does not exist yet
    #[arg(
        long = "genesis-balance",
        value_name = "TOKENS",
        global = true,
        allow_negative_numbers = true
    )]
    pub genesis_balance: Option<Balance>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available store backends
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Create the wallets table if it does not exist
    Migrate,
    /// Print one wallet as CSV
    Get { address: String },
    /// Provision a new wallet
    Create {
        address: String,
        #[arg(default_value_t = 0, allow_negative_numbers = true)]
        balance: Balance,
    },
    /// Move tokens between two wallets and print the new source balance
    Transfer {
        from: String,
        to: String,
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
    /// Provision wallets from an `address,balance` CSV file, skipping existing ones
    Import {
        #[arg(value_name = "INPUT")]
        input_file: PathBuf,
    },
    /// Write every wallet to stdout as CSV
    Export,
    /// Run a concurrent transfer workload against a fresh in-memory store
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, PartialEq)]
pub struct SimulateArgs {
    /// Number of funded wallets
    #[arg(long = "wallets", value_name = "COUNT", help = "Number of funded wallets (default: 16)")]
    pub wallets: Option<usize>,

    /// Number of transfers to attempt
    #[arg(long = "transfers", value_name = "COUNT", help = "Number of transfers (default: 10000)")]
    pub transfers: Option<usize>,

    /// Number of concurrent workers
    #[arg(long = "workers", value_name = "COUNT", help = "Concurrent workers (default: CPU cores)")]
    pub workers: Option<usize>,

    /// Starting balance of each funded wallet
    #[arg(long = "initial-balance", value_name = "TOKENS", allow_negative_numbers = true)]
    pub initial_balance: Option<Balance>,

    /// Largest single transfer amount
    #[arg(long = "max-amount", value_name = "TOKENS", allow_negative_numbers = true)]
    pub max_amount: Option<Amount>,

    /// Workload seed
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,
}

impl CliArgs {
    /// Create a StoreConfig from CLI arguments
    ///
    /// Values that are not given fall back to the defaults. Zero values are
    /// rejected with a warning and also fall back to the defaults.
    pub fn to_store_config(&self) -> StoreConfig {
        let default = StoreConfig::default();

        let max_connections = match self.max_connections {
            Some(0) => {
                warn!(default = default.max_connections, "Invalid max_connections (0), using default");
                default.max_connections
            }
            Some(count) => count,
            None => default.max_connections,
        };

        let lock_timeout = match self.lock_timeout_ms {
            Some(0) => {
                warn!(default = ?default.lock_timeout, "Invalid lock_timeout_ms (0), using default");
                default.lock_timeout
            }
            Some(millis) => Some(Duration::from_millis(millis)),
            None => default.lock_timeout,
        };

        StoreConfig {
            lock_timeout,
            max_connections,
            database_url: self.database_url.clone(),
        }
    }
}

impl SimulateArgs {
    /// Create a SimulationConfig from CLI arguments
    pub fn to_simulation_config(&self) -> SimulationConfig {
        let default = SimulationConfig::default();

        let mut config = SimulationConfig::new(
            self.wallets.unwrap_or(default.wallets),
            self.transfers.unwrap_or(default.transfers),
            self.workers.unwrap_or(default.workers),
        );

        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        match self.initial_balance {
            Some(balance) if balance < 0 => {
                warn!(balance, "Invalid initial_balance, using default");
            }
            Some(balance) => config = config.with_initial_balance(balance),
            None => {}
        }
        match self.max_amount {
            Some(amount) if amount <= 0 => {
                warn!(amount, "Invalid max_amount, using default");
            }
            Some(amount) => config = config.with_max_amount(amount),
            None => {}
        }
        config
    }
}
