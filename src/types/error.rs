//! Error types for the wallet ledger
//!
//! This module defines all error types that can occur while reading, creating,
//! and transferring between wallets.
//!
//! # Error Categories
//!
//! - **Validation Errors**: invalid amount, self transfer, invalid address.
//!   Detected before any transaction is opened and never retried.
//! - **Business Errors**: insufficient balance, missing source, duplicate wallet.
//!   The transaction is rolled back and the error is returned as-is.
//! - **Store Errors**: lock-wait timeouts, connection failures, unexpected row
//!   counts. Wrapped in [`WalletError::StoreFailure`]; always rolled back.
//! - **File Errors**: I/O and CSV parsing for wallet import/export.

use super::address::Address;
use super::wallet::{Amount, Balance};
use thiserror::Error;

/// Errors raised by a [`WalletStore`](crate::core::WalletStore) backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A wallet with this address already exists
    ///
    /// Raised by `create` through the store's uniqueness constraint.
    #[error("Wallet {address} already exists")]
    AlreadyExists {
        /// The duplicated address
        address: Address,
    },

    /// An update touched an unexpected number of rows
    ///
    /// `set_balance` must update exactly one record. Any other count means the
    /// row disappeared or the locking protocol was bypassed.
    #[error("Update of wallet {address} affected {affected} rows, expected 1")]
    RowCount {
        /// Address that was being updated
        address: Address,
        /// Rows actually affected
        affected: u64,
    },

    /// Waiting for a row lock exceeded the configured timeout
    #[error("Timed out waiting for the lock on wallet {address}")]
    LockTimeout {
        /// Address whose lock could not be acquired
        address: Address,
    },

    /// The store refused a write that would break a table constraint
    #[error("Constraint violation on wallet {address}: {message}")]
    ConstraintViolation {
        /// Address that was being written
        address: Address,
        /// Description of the violated constraint
        message: String,
    },

    /// Connection, protocol or other backend failure
    #[error("Store backend error: {message}")]
    Backend {
        /// Description of the backend failure
        message: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::Backend {
            message: error.to_string(),
        }
    }
}

impl StoreError {
    pub fn already_exists(address: &Address) -> Self {
        StoreError::AlreadyExists {
            address: address.clone(),
        }
    }

    pub fn row_count(address: &Address, affected: u64) -> Self {
        StoreError::RowCount {
            address: address.clone(),
            affected,
        }
    }

    pub fn lock_timeout(address: &Address) -> Self {
        StoreError::LockTimeout {
            address: address.clone(),
        }
    }

    pub fn constraint_violation(address: &Address, message: &str) -> Self {
        StoreError::ConstraintViolation {
            address: address.clone(),
            message: message.to_string(),
        }
    }

    pub fn backend(message: &str) -> Self {
        StoreError::Backend {
            message: message.to_string(),
        }
    }
}

/// Main error type for the wallet ledger
///
/// Every operation exposed by [`WalletService`](crate::core::WalletService) and
/// [`TransferEngine`](crate::core::TransferEngine) returns this error. A failed
/// call never leaves a partially applied balance update behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    /// Transfer amount or initial balance is not acceptable
    ///
    /// Transfers require a strictly positive amount; initial balances must not
    /// be negative.
    #[error("Invalid amount {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Amount,
    },

    /// Source and destination are the same wallet
    #[error("Cannot transfer from wallet {address} to itself")]
    SelfTransfer {
        /// The address used on both sides
        address: String,
    },

    /// Address rejected by the address validator
    #[error("Invalid address '{address}'")]
    InvalidAddress {
        /// The rejected address string
        address: String,
    },

    /// The source wallet of a transfer does not exist
    ///
    /// Source wallets are never created implicitly.
    #[error("Source wallet {address} does not exist")]
    SourceNotFound {
        /// The missing source address
        address: Address,
    },

    /// A wallet looked up by address does not exist
    #[error("Wallet {address} does not exist")]
    WalletNotFound {
        /// The missing address
        address: Address,
    },

    /// A wallet with this address already exists
    #[error("Wallet {address} already exists")]
    AlreadyExists {
        /// The duplicated address
        address: Address,
    },

    /// Source balance is lower than the requested amount
    #[error("Insufficient balance in wallet {address}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Source wallet address
        address: Address,
        /// Balance at the time of the check (under lock)
        available: Balance,
        /// Requested transfer amount
        requested: Amount,
    },

    /// Crediting the destination would overflow its balance
    #[error("Balance overflow crediting wallet {address}")]
    BalanceOverflow {
        /// Destination wallet address
        address: Address,
    },

    /// Unexpected store or transaction failure
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),

    /// I/O error while reading or writing wallet files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error in a wallet file
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        WalletError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for WalletError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        WalletError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl WalletError {
    pub fn invalid_amount(amount: Amount) -> Self {
        WalletError::InvalidAmount { amount }
    }

    pub fn self_transfer(address: &str) -> Self {
        WalletError::SelfTransfer {
            address: address.to_string(),
        }
    }

    pub fn invalid_address(address: &str) -> Self {
        WalletError::InvalidAddress {
            address: address.to_string(),
        }
    }

    pub fn source_not_found(address: &Address) -> Self {
        WalletError::SourceNotFound {
            address: address.clone(),
        }
    }

    pub fn wallet_not_found(address: &Address) -> Self {
        WalletError::WalletNotFound {
            address: address.clone(),
        }
    }

    pub fn already_exists(address: &Address) -> Self {
        WalletError::AlreadyExists {
            address: address.clone(),
        }
    }

    pub fn insufficient_balance(address: &Address, available: Balance, requested: Amount) -> Self {
        WalletError::InsufficientBalance {
            address: address.clone(),
            available,
            requested,
        }
    }

    pub fn balance_overflow(address: &Address) -> Self {
        WalletError::BalanceOverflow {
            address: address.clone(),
        }
    }

    /// Short, stable name of the error kind, used for log fields and reports
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::InvalidAmount { .. } => "invalid_amount",
            WalletError::SelfTransfer { .. } => "self_transfer",
            WalletError::InvalidAddress { .. } => "invalid_address",
            WalletError::SourceNotFound { .. } => "source_not_found",
            WalletError::WalletNotFound { .. } => "wallet_not_found",
            WalletError::AlreadyExists { .. } => "already_exists",
            WalletError::InsufficientBalance { .. } => "insufficient_balance",
            WalletError::BalanceOverflow { .. } => "balance_overflow",
            WalletError::StoreFailure(_) => "store_failure",
            WalletError::IoError { .. } => "io_error",
            WalletError::ParseError { .. } => "parse_error",
        }
    }
}
