//! CSV format handling for wallet records
//!
//! Both import and export use the same two columns:
//!
//! ```text
//! address,balance
//! 0x0000000000000000000000000000000000000001,100
//! ```
//!
//! Records are not validated here; addresses and balances go through the
//! wallet service like any other provisioning request.

use crate::types::{Balance, Wallet, WalletError};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// CSV record structure for one wallet row
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub address: String,
    pub balance: Balance,
}

impl From<&Wallet> for WalletRecord {
    fn from(wallet: &Wallet) -> Self {
        WalletRecord {
            address: wallet.address.to_string(),
            balance: wallet.balance,
        }
    }
}

/// Write wallets as CSV
///
/// Wallets are sorted by address for deterministic output, the same order
/// in which they are locked.
pub fn write_wallets_csv(wallets: &[Wallet], output: &mut dyn Write) -> Result<(), WalletError> {
    let mut writer = csv::Writer::from_writer(output);

    let mut sorted: Vec<&Wallet> = wallets.iter().collect();
    sorted.sort_by(|a, b| a.address.cmp(&b.address));

    // serialize() only emits the header with the first record
    if sorted.is_empty() {
        writer.write_record(["address", "balance"])?;
    }
    for wallet in sorted {
        writer.serialize(WalletRecord::from(wallet))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;
    use rstest::rstest;

    fn addr(n: u64) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn render(wallets: &[Wallet]) -> String {
        let mut output = Vec::new();
        write_wallets_csv(wallets, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[rstest]
    #[case::empty(vec![], "address,balance\n")]
    #[case::single(
        vec![Wallet::new(addr(1), 100)],
        "address,balance\n0x0000000000000000000000000000000000000001,100\n"
    )]
    #[case::sorted_by_address(
        vec![Wallet::new(addr(0xb), 2), Wallet::new(addr(0xa), 1)],
        "address,balance\n\
         0x000000000000000000000000000000000000000a,1\n\
         0x000000000000000000000000000000000000000b,2\n"
    )]
    fn test_write_wallets_csv(#[case] wallets: Vec<Wallet>, #[case] expected: &str) {
        assert_eq!(render(&wallets), expected);
    }

    #[test]
    fn test_record_from_wallet() {
        let record = WalletRecord::from(&Wallet::new(addr(7), 42));
        assert_eq!(
            record,
            WalletRecord {
                address: "0x0000000000000000000000000000000000000007".to_string(),
                balance: 42,
            }
        );
    }
}
