//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `address`: Wallet address identifier and its canonical ordering
//! - `wallet`: Wallet record and balance types
//! - `error`: Error types for the wallet ledger and its stores

pub mod address;
pub mod error;
pub mod wallet;

pub use address::Address;
pub use error::{StoreError, WalletError};
pub use wallet::{Amount, Balance, Wallet};
