//! Wallet Ledger Library
//! # Overview
//!
//! This library keeps per-address token balances ("wallets") and moves tokens
//! between them with transfers that stay correct under any amount of
//! concurrency.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Address, Wallet, errors)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Transfer protocol: canonical lock order, balance check, atomic update
//!   - [`core::service`] - Facade exposing get/create/transfer
//!   - [`core::traits`] - `WalletStore` and `AddressValidator` abstractions
//! - [`store`] - Store backends (in-memory, PostgreSQL) and the transaction boundary
//! - [`io`] - CSV import/export of wallets
//! - [`simulation`] - Concurrent transfer workloads against an in-memory store
//! - [`cli`] - CLI arguments parsing and command execution
//! - [`logging`] - Tracing subscriber setup
//!
//! # Invariants
//!
//! - No wallet balance is ever negative.
//! - A successful transfer conserves the sum of the two balances involved.
//! - A failed call leaves every balance as it was.
//! - Concurrent transfers never deadlock: both wallets are always locked in
//!   byte-wise address order, whichever of them is the source.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod simulation;
pub mod store;
pub mod types;

pub use core::{AddressValidator, HexAddressValidator, TransferEngine, WalletService, WalletStore};
pub use io::{read_wallets_csv, write_wallets_csv};
pub use store::{run_in_transaction, InMemoryWalletStore, PostgresWalletStore, StoreConfig};
pub use types::{Address, Amount, Balance, StoreError, Wallet, WalletError};
