//! Concurrent transfer workloads
//!
//! This module drives many transfers at once through a [`WalletService`] and
//! reports whether the ledger held up: every token accounted for, no negative
//! balance, and every call finished.
//!
//! # Workload
//!
//! ```text
//! SimulationConfig (wallets, transfers, workers, seed)
//!     ├── provision `wallets` funded wallets
//!     ├── plan `transfers` random (from, to, amount) triples with a seeded StdRng
//!     ├── split the plan round-robin across `workers` tokio tasks
//!     └── SimulationReport (committed, rejected by kind, totals before/after)
//! ```
//!
//! Destinations are drawn from a range a quarter larger than the funded set, so
//! part of the workload exercises lazy destination creation while other
//! transfers touch the same wallets.

use crate::core::{WalletService, WalletStore};
use crate::types::{Address, Amount, Balance, StoreError, Wallet, WalletError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Settings for one simulation run
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Number of funded wallets provisioned before the run
    pub wallets: usize,
    /// Total number of transfers attempted
    pub transfers: usize,
    /// Number of concurrent worker tasks
    pub workers: usize,
    /// Balance of each funded wallet
    pub initial_balance: Balance,
    /// Largest amount a single transfer requests
    pub max_amount: Amount,
    /// Seed for the workload generator
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            wallets: 16,
            transfers: 10_000,
            workers: num_cpus::get(),
            initial_balance: 1_000,
            max_amount: 100,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Create a config, replacing zero counts with defaults
    pub fn new(wallets: usize, transfers: usize, workers: usize) -> Self {
        let default = Self::default();

        let wallets = if wallets == 0 {
            warn!(wallets, default = default.wallets, "Invalid wallet count, using default");
            default.wallets
        } else {
            wallets
        };

        let transfers = if transfers == 0 {
            warn!(transfers, default = default.transfers, "Invalid transfer count, using default");
            default.transfers
        } else {
            transfers
        };

        let workers = if workers == 0 {
            warn!(workers, default = default.workers, "Invalid worker count, using default");
            default.workers
        } else {
            workers
        };

        Self {
            wallets,
            transfers,
            workers,
            ..default
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_initial_balance(mut self, initial_balance: Balance) -> Self {
        self.initial_balance = initial_balance;
        self
    }

    pub fn with_max_amount(mut self, max_amount: Amount) -> Self {
        self.max_amount = max_amount;
        self
    }
}

/// Outcome of a simulation run
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub committed: usize,
    /// Rejected transfers keyed by [`WalletError::kind`]
    pub rejected: BTreeMap<&'static str, usize>,
    pub total_before: i128,
    pub total_after: i128,
    pub wallets_after: usize,
    pub min_balance: Balance,
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Tokens neither appeared nor vanished
    pub fn is_conserved(&self) -> bool {
        self.total_before == self.total_after
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "committed:     {}", self.committed)?;
        writeln!(f, "rejected:      {}", self.rejected_total())?;
        for (kind, count) in &self.rejected {
            writeln!(f, "  {kind}: {count}")?;
        }
        writeln!(f, "wallets:       {}", self.wallets_after)?;
        writeln!(f, "total before:  {}", self.total_before)?;
        writeln!(f, "total after:   {}", self.total_after)?;
        writeln!(f, "min balance:   {}", self.min_balance)?;
        writeln!(f, "conserved:     {}", self.is_conserved())?;
        write!(f, "elapsed:       {:?}", self.elapsed)
    }
}

/// Address of the `index`-th simulated wallet
pub fn simulated_address(index: usize) -> Address {
    Address::new(format!("0x{:040x}", index + 1))
}

#[derive(Debug, Clone)]
struct PlannedTransfer {
    from: Address,
    to: Address,
    amount: Amount,
}

fn plan_transfers(config: &SimulationConfig) -> Vec<Vec<PlannedTransfer>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let destinations = config.wallets + (config.wallets / 4).max(1);
    let max_amount = config.max_amount.max(1);

    let mut plans = vec![Vec::new(); config.workers];
    for i in 0..config.transfers {
        let from = rng.gen_range(0..config.wallets);
        let to = rng.gen_range(0..destinations);
        let amount = rng.gen_range(1..=max_amount);
        plans[i % config.workers].push(PlannedTransfer {
            from: simulated_address(from),
            to: simulated_address(to),
            amount,
        });
    }
    plans
}

#[derive(Debug, Default)]
struct WorkerTally {
    committed: usize,
    rejected: BTreeMap<&'static str, usize>,
}

/// Sum of all balances, wide enough that no set of `Balance` values overflows it
fn sum_balances(wallets: &[Wallet]) -> i128 {
    wallets.iter().map(|w| i128::from(w.balance)).sum()
}

/// Provision funded wallets, run the planned transfers concurrently and
/// collect the outcome
///
/// Expects a store without wallets at the simulated addresses. Rejected
/// transfers are counted, not returned; only provisioning, worker and
/// listing failures end the run with an error.
pub async fn run_simulation<S>(
    service: &WalletService<S>,
    config: &SimulationConfig,
) -> Result<SimulationReport, WalletError>
where
    S: WalletStore + 'static,
{
    for index in 0..config.wallets {
        let address = simulated_address(index);
        service.create_wallet(address.as_str(), config.initial_balance).await?;
    }
    let total_before = sum_balances(&service.list_wallets().await?);

    info!(
        wallets = config.wallets,
        transfers = config.transfers,
        workers = config.workers,
        seed = config.seed,
        "Starting simulation"
    );

    let started = Instant::now();
    let mut handles = Vec::with_capacity(config.workers);
    for (worker, plan) in plan_transfers(config).into_iter().enumerate() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let mut tally = WorkerTally::default();
            for transfer in plan {
                match service
                    .transfer(transfer.from.as_str(), transfer.to.as_str(), transfer.amount)
                    .await
                {
                    Ok(_) => tally.committed += 1,
                    Err(err) => *tally.rejected.entry(err.kind()).or_insert(0) += 1,
                }
            }
            debug!(worker, committed = tally.committed, "Worker finished");
            tally
        }));
    }

    let mut committed = 0;
    let mut rejected: BTreeMap<&'static str, usize> = BTreeMap::new();
    for handle in handles {
        let tally = handle
            .await
            .map_err(|err| StoreError::backend(&format!("simulation worker failed: {err}")))?;
        committed += tally.committed;
        for (kind, count) in tally.rejected {
            *rejected.entry(kind).or_insert(0) += count;
        }
    }
    let elapsed = started.elapsed();

    let wallets = service.list_wallets().await?;
    let total_after = sum_balances(&wallets);
    let min_balance = wallets.iter().map(|w| w.balance).min().unwrap_or(0);

    let report = SimulationReport {
        committed,
        rejected,
        total_before,
        total_after,
        wallets_after: wallets.len(),
        min_balance,
        elapsed,
    };

    if report.is_conserved() {
        info!(committed, elapsed_ms = elapsed.as_millis() as u64, "Simulation finished");
    } else {
        warn!(
            total_before = %total_before,
            total_after = %total_after,
            "Simulation finished with a conservation mismatch"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HexAddressValidator;
    use crate::store::InMemoryWalletStore;
    use rstest::rstest;
    use std::sync::Arc;

    fn service() -> WalletService<InMemoryWalletStore> {
        WalletService::new(Arc::new(InMemoryWalletStore::new()), Arc::new(HexAddressValidator))
    }

    #[rstest]
    #[case::all_set(8, 100, 4, (8, 100, 4))]
    #[case::zero_wallets(0, 100, 4, (16, 100, 4))]
    #[case::zero_transfers(8, 0, 4, (8, 10_000, 4))]
    #[case::zero_workers(8, 100, 0, (8, 100, num_cpus::get()))]
    fn test_config_zero_values_fallback(
        #[case] wallets: usize,
        #[case] transfers: usize,
        #[case] workers: usize,
        #[case] expected: (usize, usize, usize),
    ) {
        let config = SimulationConfig::new(wallets, transfers, workers);
        assert_eq!((config.wallets, config.transfers, config.workers), expected);
    }

    #[test]
    fn test_plan_is_deterministic_and_complete() {
        let config = SimulationConfig::new(4, 103, 3).with_seed(7);

        let first = plan_transfers(&config);
        let second = plan_transfers(&config);

        assert_eq!(first.len(), 3);
        assert_eq!(first.iter().map(Vec::len).sum::<usize>(), 103);
        for (a, b) in first.iter().flatten().zip(second.iter().flatten()) {
            assert_eq!((&a.from, &a.to, a.amount), (&b.from, &b.to, b.amount));
            assert!(a.amount >= 1 && a.amount <= config.max_amount);
        }
    }

    #[test]
    fn test_simulated_addresses_are_valid() {
        use crate::core::AddressValidator;

        assert!(HexAddressValidator.is_valid(simulated_address(0).as_str()));
        assert!(HexAddressValidator.is_valid(simulated_address(9_999).as_str()));
        assert_ne!(simulated_address(0), simulated_address(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simulation_conserves_tokens() {
        let service = service();
        let config = SimulationConfig::new(8, 2_000, 8).with_initial_balance(500);

        let report = run_simulation(&service, &config).await.unwrap();

        assert_eq!(report.total_before, 8 * 500);
        assert!(report.is_conserved(), "{report}");
        assert!(report.min_balance >= 0);
        assert_eq!(report.committed + report.rejected_total(), 2_000);
        assert!(report.committed > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_simulation_totals_do_not_overflow_at_max_balance() {
        let service = service();
        let config = SimulationConfig::new(2, 50, 2).with_initial_balance(Balance::MAX);

        let report = run_simulation(&service, &config).await.unwrap();

        assert_eq!(report.total_before, 2 * i128::from(Balance::MAX));
        assert_eq!(report.total_after, report.total_before);
        assert_eq!(report.committed + report.rejected_total(), 50);
        // Credits into the other funded wallet cannot fit
        assert!(report.rejected.contains_key("balance_overflow"), "{report}");
    }

    #[tokio::test]
    async fn test_simulation_rejects_existing_wallets() {
        let service = service();
        service
            .create_wallet(simulated_address(0).as_str(), 1)
            .await
            .unwrap();

        let result = run_simulation(&service, &SimulationConfig::new(2, 10, 1)).await;

        assert_eq!(result, Err(WalletError::already_exists(&simulated_address(0))));
    }
}
