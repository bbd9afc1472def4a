//! End-to-end integration tests
//!
//! These tests run the complete ledger pipeline against predefined CSV
//! fixtures. Each test:
//! 1. Imports wallets.csv from a fixture directory
//! 2. Applies every row of transfers.csv in order, ignoring rejected ones
//! 3. Exports all wallets as CSV
//! 4. Compares the export with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path transfers
//! - Insufficient balances
//! - Lazy destination creation (and no creation of missing sources)
//! - Rejected requests (bad amounts, self transfers, bad addresses)
//! - Transfers in both directions across the lock order

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use wallet_ledger::io::{read_wallets_csv, write_wallets_csv};
    use wallet_ledger::{Amount, HexAddressValidator, InMemoryWalletStore, WalletService};

    #[derive(Debug, Deserialize)]
    struct TransferRow {
        from: String,
        to: String,
        amount: Amount,
    }

    /// Run a fixture and compare the exported wallets with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if a fixture file cannot be read or the export doesn't match.
    async fn run_test_fixture(fixture_name: &str) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let wallets_path = format!("{}/wallets.csv", fixture_dir);
        let transfers_path = format!("{}/transfers.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        let service = WalletService::new(
            Arc::new(InMemoryWalletStore::new()),
            Arc::new(HexAddressValidator),
        );

        for record in read_wallets_csv(Path::new(&wallets_path))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", wallets_path, e))
        {
            service
                .create_wallet(&record.address, record.balance)
                .await
                .unwrap_or_else(|e| panic!("Failed to provision {}: {}", record.address, e));
        }

        let mut reader = csv::Reader::from_path(&transfers_path)
            .unwrap_or_else(|e| panic!("Failed to open {}: {}", transfers_path, e));
        for row in reader.deserialize::<TransferRow>() {
            let row = row.unwrap_or_else(|e| panic!("Bad transfer row: {}", e));
            // Rejected transfers must leave no trace in the export
            let _ = service.transfer(&row.from, &row.to, row.amount).await;
        }

        let mut actual = Vec::new();
        let wallets = service.list_wallets().await.expect("Failed to list wallets");
        write_wallets_csv(&wallets, &mut actual).expect("Failed to write CSV");
        let actual_output = String::from_utf8(actual).expect("CSV output is not UTF-8");

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {}\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("happy_path")]
    #[case("insufficient_balance")]
    #[case("lazy_creation")]
    #[case("rejected_requests")]
    #[case("ordering_independent")]
    #[tokio::test]
    async fn test_fixtures(#[case] fixture: &str) {
        run_test_fixture(fixture).await;
    }
}
