//! Wallet record for the ledger
//!
//! This module defines the Wallet structure and the integer types used for
//! balances and transfer amounts.

use super::address::Address;
use serde::{Deserialize, Serialize};

/// Token balance of a wallet
///
/// Always non-negative once stored. Kept signed so it maps directly onto the
/// `BIGINT` column of the relational store.
pub type Balance = i64;

/// Requested transfer amount
///
/// Signed so that a negative request can be represented and rejected with
/// `InvalidAmount` instead of failing to parse.
pub type Amount = i64;

/// Wallet state
///
/// A snapshot of one wallet as read from a store. Holding a `Wallet` value does
/// not hold any lock; locks belong to the session that read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet address
    pub address: Address,

    /// Number of tokens held by the wallet
    pub balance: Balance,
}

impl Wallet {
    pub fn new(address: Address, balance: Balance) -> Self {
        Wallet { address, balance }
    }
}
