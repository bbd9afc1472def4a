use super::args::{CliArgs, Command, SimulateArgs, StoreBackend};
use crate::core::{HexAddressValidator, WalletService, WalletStore};
use crate::io::{write_wallets_csv, WalletReader};
use crate::simulation::run_simulation;
use crate::store::{InMemoryWalletStore, PostgresWalletStore, StoreConfig};
use crate::types::WalletError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Address of the genesis wallet seeded by `--genesis-balance`
pub const GENESIS_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Execute the parsed command, writing its results to `output`
pub async fn execute(args: &CliArgs, output: &mut dyn Write) -> Result<(), WalletError> {
    let config = args.to_store_config();

    if let Command::Simulate(simulate) = &args.command {
        return simulate_workload(simulate, &config, output).await;
    }

    match args.backend {
        StoreBackend::Memory => {
            if args.command == Command::Migrate {
                info!("In-memory store has no schema, nothing to migrate");
                return Ok(());
            }
            let store = InMemoryWalletStore::with_config(&config);
            run(Arc::new(store), args, output).await
        }
        StoreBackend::Postgres => {
            let store = PostgresWalletStore::connect(&config).await?;
            if args.command == Command::Migrate {
                store.migrate().await?;
                return Ok(());
            }
            run(Arc::new(store), args, output).await
        }
    }
}

async fn run<S>(store: Arc<S>, args: &CliArgs, output: &mut dyn Write) -> Result<(), WalletError>
where
    S: WalletStore + 'static,
{
    let service = WalletService::new(store, Arc::new(HexAddressValidator));

    if let Some(balance) = args.genesis_balance {
        let (wallet, created) = service.ensure_wallet(GENESIS_ADDRESS, balance).await?;
        if created {
            info!(address = %wallet.address, balance, "Genesis wallet seeded");
        } else {
            info!(address = %wallet.address, balance = wallet.balance, "Genesis wallet already exists");
        }
    }

    match &args.command {
        Command::Get { address } => {
            let wallet = service.get_wallet(address).await?;
            write_wallets_csv(&[wallet], output)
        }
        Command::Create { address, balance } => {
            let wallet = service.create_wallet(address, *balance).await?;
            write_wallets_csv(&[wallet], output)
        }
        Command::Transfer { from, to, amount } => {
            let new_balance = service.transfer(from, to, *amount).await?;
            writeln!(output, "{new_balance}")?;
            Ok(())
        }
        Command::Import { input_file } => import_wallets(&service, input_file, output).await,
        Command::Export => {
            let wallets = service.list_wallets().await?;
            write_wallets_csv(&wallets, output)
        }
        // Handled before a store is opened
        Command::Migrate | Command::Simulate(_) => Ok(()),
    }
}

/// Provision every wallet listed in `input_file`
///
/// The whole file is parsed before anything is written, so a malformed row
/// aborts the import without provisioning a partial set. Addresses that
/// already hold a wallet are reported and skipped.
async fn import_wallets<S>(
    service: &WalletService<S>,
    input_file: &Path,
    output: &mut dyn Write,
) -> Result<(), WalletError>
where
    S: WalletStore + 'static,
{
    let records = WalletReader::new(input_file)?.collect::<Result<Vec<_>, _>>()?;

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for record in records {
        match service.create_wallet(&record.address, record.balance).await {
            Ok(_) => imported += 1,
            Err(WalletError::AlreadyExists { address }) => {
                warn!(address = %address, "Wallet already exists, skipping");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    info!(imported, skipped, file = %input_file.display(), "Import finished");
    writeln!(output, "imported: {imported}, skipped: {skipped}")?;
    Ok(())
}

async fn simulate_workload(
    simulate: &SimulateArgs,
    config: &StoreConfig,
    output: &mut dyn Write,
) -> Result<(), WalletError> {
    let store = Arc::new(InMemoryWalletStore::with_config(config));
    let service = WalletService::new(store, Arc::new(HexAddressValidator));

    let report = run_simulation(&service, &simulate.to_simulation_config()).await?;
    writeln!(output, "{report}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const FIRST: &str = "0x0000000000000000000000000000000000000001";
    const SECOND: &str = "0x0000000000000000000000000000000000000002";

    async fn execute_args(args: &[&str]) -> (Result<(), WalletError>, String) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let mut output = Vec::new();
        let result = execute(&parsed, &mut output).await;
        (result, String::from_utf8(output).unwrap())
    }

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[tokio::test]
    async fn test_transfer_from_genesis() {
        let (result, output) = execute_args(&[
            "program",
            "--genesis-balance",
            "1000",
            "transfer",
            GENESIS_ADDRESS,
            FIRST,
            "250",
        ])
        .await;

        assert_eq!(result, Ok(()));
        assert_eq!(output, "750\n");
    }

    #[tokio::test]
    async fn test_create_prints_wallet() {
        let (result, output) = execute_args(&["program", "create", FIRST, "100"]).await;

        assert_eq!(result, Ok(()));
        assert_eq!(output, format!("address,balance\n{FIRST},100\n"));
    }

    #[tokio::test]
    async fn test_get_missing_wallet_fails() {
        let (result, output) = execute_args(&["program", "get", FIRST]).await;

        assert!(matches!(result, Err(WalletError::WalletNotFound { .. })));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_errors_surface() {
        let (result, _) = execute_args(&["program", "transfer", FIRST, SECOND, "-5"]).await;
        assert_eq!(result, Err(WalletError::invalid_amount(-5)));

        let (result, _) = execute_args(&["program", "transfer", FIRST, SECOND, "5"]).await;
        assert!(matches!(result, Err(WalletError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_export_includes_genesis() {
        let (result, output) =
            execute_args(&["program", "--genesis-balance", "7", "export"]).await;

        assert_eq!(result, Ok(()));
        assert_eq!(output, format!("address,balance\n{GENESIS_ADDRESS},7\n"));
    }

    #[tokio::test]
    async fn test_import_skips_existing() {
        let file = create_temp_csv(&format!(
            "address,balance\n{FIRST},10\n{SECOND},20\n{FIRST},30\n"
        ));
        let path = file.path().to_str().unwrap();

        let (result, output) = execute_args(&["program", "import", path]).await;

        assert_eq!(result, Ok(()));
        assert_eq!(output, "imported: 2, skipped: 1\n");
    }

    #[tokio::test]
    async fn test_import_aborts_on_malformed_row() {
        let file = create_temp_csv(&format!("address,balance\n{FIRST},10\n{SECOND},lots\n"));
        let path = file.path().to_str().unwrap();

        let (result, output) = execute_args(&["program", "import", path]).await;

        assert!(matches!(result, Err(WalletError::ParseError { .. })));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_address() {
        let file = create_temp_csv("address,balance\n0x12,10\n");
        let path = file.path().to_str().unwrap();

        let (result, _) = execute_args(&["program", "import", path]).await;

        assert_eq!(result, Err(WalletError::invalid_address("0x12")));
    }

    #[tokio::test]
    async fn test_memory_migrate_is_noop() {
        let (result, output) = execute_args(&["program", "migrate"]).await;

        assert_eq!(result, Ok(()));
        assert!(output.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_simulate_reports_conservation() {
        let (result, output) = execute_args(&[
            "program",
            "simulate",
            "--wallets",
            "4",
            "--transfers",
            "200",
            "--workers",
            "4",
        ])
        .await;

        assert_eq!(result, Ok(()));
        assert!(output.contains("conserved:     true"), "{output}");
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_url() {
        let parsed = CliArgs::try_parse_from(["program", "--backend", "postgres", "export"]).unwrap();
        if parsed.database_url.is_some() {
            // DATABASE_URL is set in this environment
            return;
        }

        let mut output = Vec::new();
        let result = execute(&parsed, &mut output).await;

        assert!(matches!(result, Err(WalletError::StoreFailure(_))));
    }
}
