//! I/O module
//!
//! Handles wallet CSV import and export.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record structure, output serialization)
//! - `wallet_reader` - Streaming CSV reader with iterator interface

pub mod csv_format;
pub mod wallet_reader;

pub use csv_format::{write_wallets_csv, WalletRecord};
pub use wallet_reader::{read_wallets_csv, WalletReader};
