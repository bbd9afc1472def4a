//! Streaming CSV reader for wallet files
//!
//! `WalletReader` yields one [`WalletRecord`] per data row without loading the
//! whole file. A malformed row is yielded as a `ParseError` carrying its line
//! number, and iteration continues with the next row, so an import can report
//! every bad line in one pass.
//!
//! ```no_run
//! use wallet_ledger::io::WalletReader;
//! use std::path::Path;
//!
//! let reader = WalletReader::new(Path::new("wallets.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("{} -> {}", record.address, record.balance),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

use crate::io::csv_format::WalletRecord;
use crate::types::WalletError;
use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming reader over `address,balance` rows
pub struct WalletReader {
    records: DeserializeRecordsIntoIter<File, WalletRecord>,
}

impl WalletReader {
    /// Open a wallet CSV file
    ///
    /// Fields are trimmed, so `0x…01, 100` parses the same as `0x…01,100`.
    pub fn new(path: &Path) -> Result<Self, WalletError> {
        let file = File::open(path).map_err(|e| WalletError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl Iterator for WalletReader {
    type Item = Result<WalletRecord, WalletError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|row| row.map_err(WalletError::from))
    }
}

/// Read every record of a wallet CSV file
///
/// Stops at the first malformed row.
pub fn read_wallets_csv(path: &Path) -> Result<Vec<WalletRecord>, WalletError> {
    WalletReader::new(path)?.collect()
}
